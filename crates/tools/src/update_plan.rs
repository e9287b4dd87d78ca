//! Update-plan tool — structured extraction of the learning plan.
//!
//! Sends the planner instructions, the current plan (as context), and the new
//! content to the chat model's structured-output mode, constrained to the
//! [`LearningPlan`] JSON schema. The extracted plan replaces the current one
//! wholesale; there is no field-level patching.

use async_trait::async_trait;
use planweave_core::error::ToolError;
use planweave_core::message::Message;
use planweave_core::model::{ChatModel, ChatRequest};
use planweave_core::plan::LearningPlan;
use planweave_core::state::ConversationState;
use planweave_core::tool::{Tool, ToolOutcome};
use std::sync::Arc;
use tracing::{debug, warn};

const PLANNER_INSTRUCTIONS: &str = "\
You are a masterful course planner who turns a researcher's outline (already \
infused with user preferences) into a polished, week-by-week learning plan.

Task:
1. Divide the duration into `duration_weeks` sequential WeekPlan entries.
2. For each WeekPlan, specify:
   - `week_number`: 1-based index
   - `focus`: a concise statement of the week's main objective
   - `activities`: 3-5 Activity items with description and frequency
   - `resources`: 2-10 Resource items with name, type, and optional URL
   - `checkpoint`: a deliverable, assessment, or project milestone
3. All items must tie back to the weekly focus and the user's stated preferences.

When a current plan is provided below, treat the new content as a revision of \
that plan and re-emit the complete revised document.";

/// The structured-extraction tool.
pub struct UpdatePlanTool {
    model: Arc<dyn ChatModel>,
    temperature: f32,
}

impl UpdatePlanTool {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            temperature: 0.5,
        }
    }

    /// Set the extraction temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn system_message(current_plan: Option<&LearningPlan>) -> String {
        let plan_json = match current_plan {
            Some(plan) => serde_json::to_string_pretty(plan).unwrap_or_else(|_| "null".into()),
            None => "null".into(),
        };
        format!("{PLANNER_INSTRUCTIONS}\n\nCurrent plan:\n{plan_json}")
    }
}

#[async_trait]
impl Tool for UpdatePlanTool {
    fn name(&self) -> &str {
        "update_learning_plan"
    }

    fn description(&self) -> &str {
        "Call this tool when you need to create the learning plan or update it with new \
         instructions. Pass the full plan description or the revision instructions as content."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "Learning plan description or updated instructions"
                }
            },
            "required": ["content"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        state: &ConversationState,
    ) -> std::result::Result<ToolOutcome, ToolError> {
        let content = arguments["content"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'content' argument".into()))?;

        let mut request = ChatRequest::new(vec![
            Message::system(Self::system_message(state.learning_plan.as_ref())),
            Message::user(content),
        ]);
        request.temperature = self.temperature;

        debug!(has_existing_plan = state.learning_plan.is_some(), "Extracting learning plan");

        let value = self
            .model
            .extract(request, &LearningPlan::json_schema())
            .await
            .map_err(|e| ToolError::Extraction(e.to_string()))?;

        let plan: LearningPlan = serde_json::from_value(value).map_err(|e| {
            warn!(error = %e, "Extracted value did not match the plan schema");
            ToolError::Extraction(format!("output did not match the plan schema: {e}"))
        })?;

        plan.validate().map_err(ToolError::Extraction)?;

        let content = serde_json::json!({
            "plan": plan,
            "message": "learning plan canvas has been successfully updated!"
        })
        .to_string();

        Ok(ToolOutcome {
            content,
            plan: Some(plan),
            bundles: Vec::new(),
        })
    }
}
