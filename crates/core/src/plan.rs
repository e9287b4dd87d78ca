//! The learning plan document — the structured output this agent produces.
//!
//! A plan is immutable once returned by the extraction tool: revisions create a
//! whole new value which replaces the previous one via the plan reducer, never a
//! field-level patch.

use serde::{Deserialize, Serialize};

/// A complete week-by-week learning plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPlan {
    /// The subject or skill the learner wishes to acquire.
    pub topic: String,

    /// Total length of the plan in weeks.
    pub duration_weeks: u32,

    /// Ordered list of per-week plans, one per week.
    pub weekly_plans: Vec<WeekPlan>,
}

/// One week of the plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekPlan {
    /// Sequential week index starting at 1.
    pub week_number: u32,

    /// The primary learning objective for the week.
    pub focus: String,

    /// Learning activities for the week (expected 3–5).
    pub activities: Vec<Activity>,

    /// Core resources used this week (expected 2–10).
    pub resources: Vec<Resource>,

    /// Concrete deliverable or assessment at end of the week.
    pub checkpoint: String,
}

/// A single learning activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// What the learner should do, e.g. "Watch tutorial on X".
    pub description: String,

    /// How often or when, e.g. "Daily", "3x/week".
    pub frequency: String,
}

/// A learning resource reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Resource title, e.g. "Duolingo".
    pub name: String,

    /// What kind of resource this is.
    #[serde(rename = "type")]
    pub kind: ResourceKind,

    /// Optional URL to access the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// The closed set of resource types the plan schema admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    App,
    Podcast,
    Book,
    Documentation,
    Other,
}

impl LearningPlan {
    /// The JSON Schema sent to the model's structured-output mode.
    ///
    /// This is the one structural contract that must round-trip exactly through
    /// the extraction tool: `extract` is constrained to this schema and the
    /// result is deserialized straight into [`LearningPlan`].
    pub fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "topic": {
                    "type": "string",
                    "description": "The subject or skill the learner wishes to acquire."
                },
                "duration_weeks": {
                    "type": "integer",
                    "description": "Total length of the plan in weeks."
                },
                "weekly_plans": {
                    "type": "array",
                    "description": "Ordered list of per-week plans, one entry per week.",
                    "items": {
                        "type": "object",
                        "properties": {
                            "week_number": {
                                "type": "integer",
                                "description": "Sequential week index starting at 1."
                            },
                            "focus": {
                                "type": "string",
                                "description": "The primary learning objective for the week."
                            },
                            "activities": {
                                "type": "array",
                                "description": "3-5 learning activities for the week.",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "description": { "type": "string" },
                                        "frequency": { "type": "string" }
                                    },
                                    "required": ["description", "frequency"]
                                }
                            },
                            "resources": {
                                "type": "array",
                                "description": "2-10 core resources used this week.",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "name": { "type": "string" },
                                        "type": {
                                            "type": "string",
                                            "enum": ["app", "podcast", "book", "documentation", "other"]
                                        },
                                        "url": { "type": "string" }
                                    },
                                    "required": ["name", "type"]
                                }
                            },
                            "checkpoint": {
                                "type": "string",
                                "description": "Concrete deliverable or assessment at end of the week."
                            }
                        },
                        "required": ["week_number", "focus", "activities", "resources", "checkpoint"]
                    }
                }
            },
            "required": ["topic", "duration_weeks", "weekly_plans"]
        })
    }

    /// Check the invariants the schema itself cannot express.
    ///
    /// The extraction tool calls this after deserializing the model's output;
    /// a violation is surfaced as a recoverable extraction error so the model
    /// can retry with corrected content.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.topic.trim().is_empty() {
            return Err("topic is empty".into());
        }
        if self.duration_weeks == 0 {
            return Err("duration_weeks must be positive".into());
        }
        if self.weekly_plans.len() != self.duration_weeks as usize {
            return Err(format!(
                "expected {} weekly plans, got {}",
                self.duration_weeks,
                self.weekly_plans.len()
            ));
        }
        for (i, week) in self.weekly_plans.iter().enumerate() {
            let expected = i as u32 + 1;
            if week.week_number != expected {
                return Err(format!(
                    "week {} has week_number {}, expected {}",
                    i + 1,
                    week.week_number,
                    expected
                ));
            }
            if !(3..=5).contains(&week.activities.len()) {
                return Err(format!(
                    "week {} has {} activities, expected 3-5",
                    week.week_number,
                    week.activities.len()
                ));
            }
            if !(2..=10).contains(&week.resources.len()) {
                return Err(format!(
                    "week {} has {} resources, expected 2-10",
                    week.week_number,
                    week.resources.len()
                ));
            }
        }
        Ok(())
    }
}
