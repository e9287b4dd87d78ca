//! End-to-end integration tests for the Planweave agent pipeline.
//!
//! These exercise the full path from a user message through the agent loop,
//! the real tool implementations, and the state reducers, with scripted model
//! and search backends standing in for the network.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use planweave_agent::AgentLoop;
use planweave_core::error::{ModelError, SearchError};
use planweave_core::message::{Message, MessageToolCall, Role};
use planweave_core::model::{ChatModel, ChatRequest, ChatResponse};
use planweave_core::plan::LearningPlan;
use planweave_core::search::{SearchDocument, SearchOptions, SearchProvider};
use planweave_core::state::ConversationState;
use planweave_tools::default_registry;

// ── Mock backends ────────────────────────────────────────────────────────

/// A chat model that replays scripted completions and extractions in sequence.
struct ScriptedBackend {
    completions: Mutex<Vec<ChatResponse>>,
    extractions: Mutex<Vec<serde_json::Value>>,
}

impl ScriptedBackend {
    fn new(completions: Vec<ChatResponse>, extractions: Vec<serde_json::Value>) -> Self {
        Self {
            completions: Mutex::new(completions),
            extractions: Mutex::new(extractions),
        }
    }
}

#[async_trait::async_trait]
impl ChatModel for ScriptedBackend {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, _request: ChatRequest) -> Result<ChatResponse, ModelError> {
        let mut completions = self.completions.lock().unwrap();
        if completions.is_empty() {
            panic!("ScriptedBackend: completions exhausted");
        }
        Ok(completions.remove(0))
    }

    async fn extract(
        &self,
        _request: ChatRequest,
        _schema: &serde_json::Value,
    ) -> Result<serde_json::Value, ModelError> {
        let mut extractions = self.extractions.lock().unwrap();
        if extractions.is_empty() {
            panic!("ScriptedBackend: extractions exhausted");
        }
        Ok(extractions.remove(0))
    }
}

/// A search provider with fixed per-query results.
struct FixtureSearch {
    results: HashMap<String, Vec<SearchDocument>>,
    fail_unknown: bool,
}

#[async_trait::async_trait]
impl SearchProvider for FixtureSearch {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn search(
        &self,
        query: &str,
        _options: &SearchOptions,
    ) -> Result<Vec<SearchDocument>, SearchError> {
        match self.results.get(query) {
            Some(docs) => Ok(docs.clone()),
            None if self.fail_unknown => Err(SearchError::Network("no route".into())),
            None => Ok(Vec::new()),
        }
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────

fn text_response(text: &str) -> ChatResponse {
    ChatResponse {
        message: Message::assistant(text),
        model: "e2e-mock".into(),
        usage: None,
    }
}

fn tool_response(calls: Vec<(&str, &str, serde_json::Value)>) -> ChatResponse {
    let tool_calls = calls
        .into_iter()
        .map(|(id, name, args)| MessageToolCall {
            id: id.into(),
            name: name.into(),
            arguments: args.to_string(),
        })
        .collect();
    ChatResponse {
        message: Message::assistant_with_tool_calls("", tool_calls),
        model: "e2e-mock".into(),
        usage: None,
    }
}

fn doc(url: &str, title: &str) -> SearchDocument {
    SearchDocument {
        url: url.into(),
        title: title.into(),
        snippet: format!("Snippet for {title}"),
        raw_content: Some(format!("Full text of {title}")),
        score: Some(0.9),
    }
}

fn guitar_plan_json(weeks: u32) -> serde_json::Value {
    let weekly_plans: Vec<serde_json::Value> = (1..=weeks)
        .map(|n| {
            serde_json::json!({
                "week_number": n,
                "focus": format!("Week {n} focus"),
                "activities": [
                    {"description": "Practice chords", "frequency": "Daily"},
                    {"description": "Watch a lesson", "frequency": "2x/week"},
                    {"description": "Play along to a song", "frequency": "3x/week"}
                ],
                "resources": [
                    {"name": "Justin Guitar", "type": "app"},
                    {"name": "Guitar for Dummies", "type": "book"}
                ],
                "checkpoint": format!("Week {n} recording")
            })
        })
        .collect();
    serde_json::json!({
        "topic": "Guitar",
        "duration_weeks": weeks,
        "weekly_plans": weekly_plans
    })
}

fn pipeline(
    completions: Vec<ChatResponse>,
    extractions: Vec<serde_json::Value>,
    search_results: HashMap<String, Vec<SearchDocument>>,
    fail_unknown: bool,
) -> AgentLoop {
    let model = Arc::new(ScriptedBackend::new(completions, extractions));
    let search = Arc::new(FixtureSearch {
        results: search_results,
        fail_unknown,
    });
    let registry = default_registry(model.clone(), search, 1000);
    AgentLoop::new(model, Arc::new(registry))
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn research_then_plan_then_answer() {
    // Turn 1: model fans out two searches; turn 2: it builds the plan;
    // turn 3: it answers. State accumulates through every turn.
    let mut results = HashMap::new();
    results.insert(
        "guitar chords for beginners".to_string(),
        vec![
            doc("https://chords.example/a", "Open Chords"),
            doc("https://shared.example/lesson", "First Lesson"),
        ],
    );
    results.insert(
        "guitar practice schedule".to_string(),
        vec![
            doc("https://shared.example/lesson", "First Lesson (dup)"),
            doc("https://practice.example/b", "Practice Routines"),
        ],
    );

    let agent = pipeline(
        vec![
            tool_response(vec![(
                "call_1",
                "web_research",
                serde_json::json!({
                    "queries": ["guitar chords for beginners", "guitar practice schedule"]
                }),
            )]),
            tool_response(vec![(
                "call_2",
                "update_learning_plan",
                serde_json::json!({"content": "12-week beginner guitar plan"}),
            )]),
            text_response("Your 12-week guitar plan is ready."),
        ],
        vec![guitar_plan_json(12)],
        results,
        false,
    );

    let mut state = ConversationState::new();
    state.push(Message::user("Help me learn guitar in 12 weeks"));

    let answer = agent.run(&mut state).await.unwrap();
    assert_eq!(answer, "Your 12-week guitar plan is ready.");

    // Two bundles, four raw documents, despite the cross-query duplicate
    assert_eq!(state.search_results.len(), 2);
    let raw: usize = state.search_results.iter().map(|b| b.documents.len()).sum();
    assert_eq!(raw, 4);

    // The citation block the model saw has exactly 3 unique entries
    let research_result = state
        .messages
        .iter()
        .find(|m| m.tool_call_id.as_deref() == Some("call_1"))
        .unwrap();
    assert_eq!(research_result.content.matches("URL: ").count(), 3);

    // The plan landed through the reducer
    let plan = state.learning_plan.as_ref().unwrap();
    assert_eq!(plan.topic, "Guitar");
    assert_eq!(plan.duration_weeks, 12);
    assert_eq!(plan.weekly_plans.len(), 12);

    // Every tool-call request was answered by exactly one tool result
    for call_id in ["call_1", "call_2"] {
        let answers = state
            .messages
            .iter()
            .filter(|m| m.tool_call_id.as_deref() == Some(call_id))
            .count();
        assert_eq!(answers, 1, "call {call_id} should have exactly one result");
    }
}

#[tokio::test]
async fn plan_revision_replaces_wholesale() {
    let agent = pipeline(
        vec![
            tool_response(vec![(
                "call_1",
                "update_learning_plan",
                serde_json::json!({"content": "shorten to 4 weeks"}),
            )]),
            text_response("Shortened to 4 weeks."),
        ],
        vec![guitar_plan_json(4)],
        HashMap::new(),
        false,
    );

    let mut state = ConversationState::new();
    let existing: LearningPlan = serde_json::from_value(guitar_plan_json(12)).unwrap();
    state.learning_plan = Some(existing);
    state.push(Message::user("Actually, make it 4 weeks"));

    agent.run(&mut state).await.unwrap();

    let plan = state.learning_plan.as_ref().unwrap();
    assert_eq!(plan.duration_weeks, 4);
    assert_eq!(plan.weekly_plans.len(), 4);
}

#[tokio::test]
async fn failed_search_batch_becomes_recoverable_tool_error() {
    // Every query fails; the tool errors, the loop folds it into a tool
    // result, and the model still gets to answer.
    let agent = pipeline(
        vec![
            tool_response(vec![(
                "call_1",
                "web_research",
                serde_json::json!({"queries": ["unroutable"]}),
            )]),
            text_response("Search is down, answering from prior knowledge."),
        ],
        vec![],
        HashMap::new(),
        true,
    );

    let mut state = ConversationState::new();
    state.push(Message::user("research something"));

    let answer = agent.run(&mut state).await.unwrap();
    assert_eq!(answer, "Search is down, answering from prior knowledge.");

    let tool_msg = state
        .messages
        .iter()
        .find(|m| m.role == Role::Tool)
        .unwrap();
    assert!(tool_msg.content.starts_with("Error:"));
    assert!(state.search_results.is_empty());
}

#[tokio::test]
async fn invalid_extraction_keeps_prior_plan() {
    // The extractor returns a plan violating the week-count invariant: the
    // tool fails, the existing plan survives, and the loop continues.
    let mut bad_plan = guitar_plan_json(2);
    bad_plan["duration_weeks"] = serde_json::json!(5);

    let agent = pipeline(
        vec![
            tool_response(vec![(
                "call_1",
                "update_learning_plan",
                serde_json::json!({"content": "broken revision"}),
            )]),
            text_response("That revision didn't validate, keeping the old plan."),
        ],
        vec![bad_plan],
        HashMap::new(),
        false,
    );

    let mut state = ConversationState::new();
    let existing: LearningPlan = serde_json::from_value(guitar_plan_json(12)).unwrap();
    state.learning_plan = Some(existing);
    state.push(Message::user("revise the plan"));

    agent.run(&mut state).await.unwrap();

    assert_eq!(state.learning_plan.as_ref().unwrap().duration_weeks, 12);
}
