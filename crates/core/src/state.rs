//! Conversation state and the two reducers.
//!
//! The state is a single aggregate owned by the agent loop for the duration of
//! one invocation and persisted externally between invocations. Concurrent tool
//! completions are merged through exactly two pure reducers:
//!
//! - [`merge_search_results`] — append-only concatenation of raw result bundles
//! - [`merge_plan`] — last-writer-wins whole-document replacement
//!
//! `messages` is append-only: entries are concatenated in conversation order and
//! never removed or reordered.

use serde::{Deserialize, Serialize};

use crate::message::Message;
use crate::plan::LearningPlan;
use crate::search::SearchBundle;
use crate::tool::ToolOutcome;

/// The evolving aggregate of one agent session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    /// Ordered conversation turns. Tool-call request messages are immediately
    /// followed by their corresponding tool-result messages.
    pub messages: Vec<Message>,

    /// The current learning plan, absent until first extracted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learning_plan: Option<LearningPlan>,

    /// Accumulated raw search bundles, one per query ever issued.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_results: Vec<SearchBundle>,
}

impl ConversationState {
    /// Create a new empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message. This is the only way messages are added.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Merge a tool outcome into the state.
    ///
    /// Routes the plan and bundle deltas through the two reducers and appends
    /// the tool-result message answering `call_id`. This is the only mutation
    /// path for `learning_plan` and `search_results`.
    pub fn apply_outcome(&mut self, call_id: &str, outcome: ToolOutcome) {
        self.learning_plan = merge_plan(self.learning_plan.take(), outcome.plan);
        self.search_results =
            merge_search_results(std::mem::take(&mut self.search_results), outcome.bundles);
        self.push(Message::tool_result(call_id, outcome.content));
    }
}

/// Plan reducer: latest non-empty write wins.
///
/// An absent incoming value never overwrites an existing plan; a present one
/// always replaces it in full. Never a partial merge of sub-fields.
pub fn merge_plan(
    existing: Option<LearningPlan>,
    incoming: Option<LearningPlan>,
) -> Option<LearningPlan> {
    match incoming {
        Some(plan) => Some(plan),
        None => existing,
    }
}

/// An incoming update for the source merger: nothing, one bundle, or a batch.
#[derive(Debug, Clone)]
pub enum BundleDelta {
    Nothing,
    One(SearchBundle),
    Many(Vec<SearchBundle>),
}

impl From<SearchBundle> for BundleDelta {
    fn from(bundle: SearchBundle) -> Self {
        Self::One(bundle)
    }
}

impl From<Vec<SearchBundle>> for BundleDelta {
    fn from(bundles: Vec<SearchBundle>) -> Self {
        Self::Many(bundles)
    }
}

impl From<Option<Vec<SearchBundle>>> for BundleDelta {
    fn from(bundles: Option<Vec<SearchBundle>>) -> Self {
        match bundles {
            Some(b) => Self::Many(b),
            None => Self::Nothing,
        }
    }
}

impl BundleDelta {
    fn normalize(self) -> Vec<SearchBundle> {
        match self {
            Self::Nothing => Vec::new(),
            Self::One(bundle) => vec![bundle],
            Self::Many(bundles) => bundles,
        }
    }
}

/// Source merger: concatenate, preserving arrival order.
///
/// Never deduplicates — dedup is a presentation-time concern of the source
/// formatter, so historical raw results remain retrievable.
pub fn merge_search_results(
    existing: Vec<SearchBundle>,
    incoming: impl Into<BundleDelta>,
) -> Vec<SearchBundle> {
    let mut merged = existing;
    merged.extend(incoming.into().normalize());
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::LearningPlan;
    use crate::search::SearchDocument;

    fn plan(topic: &str) -> LearningPlan {
        LearningPlan {
            topic: topic.into(),
            duration_weeks: 1,
            weekly_plans: vec![],
        }
    }

    fn bundle(query: &str, urls: &[&str]) -> SearchBundle {
        SearchBundle {
            query: query.into(),
            documents: urls
                .iter()
                .map(|u| SearchDocument {
                    url: (*u).into(),
                    title: format!("Title for {u}"),
                    snippet: "snippet".into(),
                    raw_content: None,
                    score: None,
                })
                .collect(),
        }
    }

    #[test]
    fn plan_reducer_keeps_existing_when_incoming_absent() {
        let existing = Some(plan("guitar"));
        assert_eq!(merge_plan(existing.clone(), None), existing);
        assert_eq!(merge_plan(None, None), None);
    }

    #[test]
    fn plan_reducer_replaces_wholesale() {
        let merged = merge_plan(Some(plan("guitar")), Some(plan("piano")));
        assert_eq!(merged.unwrap().topic, "piano");

        let merged = merge_plan(None, Some(plan("piano")));
        assert_eq!(merged.unwrap().topic, "piano");
    }

    #[test]
    fn source_merger_concatenation_law() {
        let a = vec![bundle("q1", &["https://a.com"])];
        let b = vec![
            bundle("q2", &["https://b.com"]),
            bundle("q3", &["https://c.com"]),
        ];

        let merged = merge_search_results(a.clone(), b.clone());
        let mut expected = a;
        expected.extend(b);
        assert_eq!(merged, expected);
    }

    #[test]
    fn source_merger_normalizes_single_bundle() {
        let existing = vec![bundle("q1", &["https://a.com"])];
        let merged = merge_search_results(existing, bundle("q2", &["https://b.com"]));
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].query, "q2");
    }

    #[test]
    fn source_merger_absent_incoming_is_identity() {
        let existing = vec![bundle("q1", &["https://a.com"])];
        let merged = merge_search_results(existing.clone(), None::<Vec<SearchBundle>>);
        assert_eq!(merged, existing);
    }

    #[test]
    fn source_merger_never_dedups() {
        let existing = vec![bundle("q1", &["https://a.com"])];
        let merged = merge_search_results(existing, bundle("q2", &["https://a.com"]));
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].documents[0].url, merged[1].documents[0].url);
    }

    #[test]
    fn messages_are_append_only() {
        let mut state = ConversationState::new();
        state.push(Message::user("first"));
        state.push(Message::user("second"));

        let before: Vec<String> = state.messages.iter().map(|m| m.id.clone()).collect();
        state.push(Message::assistant("third"));

        assert_eq!(state.messages.len(), 3);
        let after: Vec<String> = state.messages.iter().map(|m| m.id.clone()).collect();
        assert_eq!(&after[..2], &before[..]);
    }

    #[test]
    fn apply_outcome_merges_and_answers_call() {
        let mut state = ConversationState::new();
        state.learning_plan = Some(plan("guitar"));

        let outcome = ToolOutcome {
            content: "2 sources found".into(),
            plan: None,
            bundles: vec![bundle("q1", &["https://a.com", "https://b.com"])],
        };
        state.apply_outcome("call_7", outcome);

        // Absent incoming plan preserved the existing one
        assert_eq!(state.learning_plan.as_ref().unwrap().topic, "guitar");
        assert_eq!(state.search_results.len(), 1);

        let last = state.messages.last().unwrap();
        assert_eq!(last.tool_call_id.as_deref(), Some("call_7"));
        assert_eq!(last.content, "2 sources found");
    }
}
