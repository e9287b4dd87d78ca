//! The agent orchestration loop.
//!
//! One invocation drives the cycle: call the model with the full history and
//! tool catalog; if the response carries tool calls, execute them all
//! concurrently, merge their deltas through the state reducers, and loop; if
//! it carries non-empty text and no tool calls, stop. An empty response with
//! no tool calls triggers a bounded "Respond with a real output." re-prompt.
//!
//! Tool failures (including unknown tool names) never abort the loop — they
//! become tool-result content the model can recover from. Only model
//! exhaustion, the self-correction bound, and cancellation are fatal.

use futures::future::join_all;
use planweave_core::error::{AgentError, ToolError};
use planweave_core::message::Message;
use planweave_core::model::{ChatModel, ChatRequest, ChatResponse, ToolDefinition};
use planweave_core::state::ConversationState;
use planweave_core::tool::{ToolCall, ToolOutcome, ToolRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::prompt::LEARNING_RESEARCHER;

/// The re-prompt appended when the model returns neither text nor tool calls.
const SELF_CORRECTION_PROMPT: &str = "Respond with a real output.";

/// The core agent loop that orchestrates model calls and tool execution.
pub struct AgentLoop {
    /// The chat model collaborator
    model: Arc<dyn ChatModel>,

    /// The registered tool catalog
    tools: Arc<ToolRegistry>,

    /// Fixed system instructions prefixed to every model call
    system_prompt: String,

    /// Temperature setting
    temperature: f32,

    /// Default max tokens per response
    max_tokens: Option<u32>,

    /// Maximum model-call attempts per turn (transient failures retried)
    max_model_attempts: u32,

    /// Base delay for exponential retry backoff
    retry_base_delay: Duration,

    /// Maximum consecutive empty-response re-prompts
    max_self_corrections: u32,

    /// Optional per-invocation deadline
    deadline: Option<Duration>,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(model: Arc<dyn ChatModel>, tools: Arc<ToolRegistry>) -> Self {
        Self {
            model,
            tools,
            system_prompt: LEARNING_RESEARCHER.to_string(),
            temperature: 0.5,
            max_tokens: None,
            max_model_attempts: 3,
            retry_base_delay: Duration::from_millis(500),
            max_self_corrections: 3,
            deadline: None,
        }
    }

    /// Override the system instructions.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the default max tokens per model response.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the maximum number of model-call attempts.
    pub fn with_max_model_attempts(mut self, max: u32) -> Self {
        self.max_model_attempts = max.max(1);
        self
    }

    /// Set the base delay for exponential retry backoff.
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Set the maximum number of consecutive empty-response re-prompts.
    pub fn with_max_self_corrections(mut self, max: u32) -> Self {
        self.max_self_corrections = max;
        self
    }

    /// Set a per-invocation deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Run the loop until the model produces a final answer.
    ///
    /// Returns the final response text; the accumulated state (new messages,
    /// plan, search results) is left in `state` for the caller to persist.
    pub async fn run(&self, state: &mut ConversationState) -> Result<String, AgentError> {
        info!(
            messages = state.messages.len(),
            has_plan = state.learning_plan.is_some(),
            "Starting agent invocation"
        );

        let deadline = self.deadline.map(|d| Instant::now() + d);
        let tool_definitions = self.tools.definitions();
        let mut corrections = 0u32;

        loop {
            let response = self
                .call_model_with_retry(state, &tool_definitions, deadline)
                .await?;
            let message = response.message;

            if message.tool_calls.is_empty() {
                if message.has_text() {
                    // Terminal: the only success exit.
                    let text = message.content.clone();
                    state.push(message);
                    info!(chars = text.len(), "Agent invocation complete");
                    return Ok(text);
                }

                // Neither text nor tool calls: re-prompt, bounded.
                corrections += 1;
                if corrections > self.max_self_corrections {
                    warn!(
                        limit = self.max_self_corrections,
                        "Model kept returning empty output"
                    );
                    return Err(AgentError::SelfCorrectionExceeded {
                        limit: self.max_self_corrections,
                    });
                }
                debug!(attempt = corrections, "Empty model output, re-prompting");
                state.push(message);
                state.push(Message::user(SELF_CORRECTION_PROMPT));
                continue;
            }

            // A usable tool-bearing response resets the correction counter.
            corrections = 0;

            let calls: Vec<ToolCall> = message
                .tool_calls
                .iter()
                .map(|tc| ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments: serde_json::from_str(&tc.arguments).unwrap_or_default(),
                })
                .collect();

            state.push(message);
            self.dispatch_tools(state, &calls, deadline).await?;
            // Loop back — the model sees the fully merged state next turn.
        }
    }

    /// Call the model, retrying transient failures with exponential backoff.
    async fn call_model_with_retry(
        &self,
        state: &ConversationState,
        tool_definitions: &[ToolDefinition],
        deadline: Option<Instant>,
    ) -> Result<ChatResponse, AgentError> {
        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        messages.push(Message::system(&self.system_prompt));
        messages.extend(state.messages.iter().cloned());

        let mut attempt = 0u32;
        loop {
            attempt += 1;

            let request = ChatRequest {
                messages: messages.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.to_vec(),
            };

            debug!(attempt, model = %self.model.name(), "Calling chat model");

            let call = self.model.complete(request);
            let result = match deadline {
                Some(d) => match tokio::time::timeout_at(d, call).await {
                    Ok(r) => r,
                    Err(_) => {
                        return Err(AgentError::Cancelled(
                            "deadline elapsed during model call".into(),
                        ));
                    }
                },
                None => call.await,
            };

            match result {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.max_model_attempts => {
                    let delay = self.backoff_delay(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient model failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(attempts = attempt, error = %e, "Model call exhausted");
                    return Err(AgentError::ModelUnavailable {
                        attempts: attempt,
                        last_error: e,
                    });
                }
            }
        }
    }

    /// Backoff before retry `attempt + 1`: base delay doubled per attempt.
    ///
    /// The exponent is capped so large attempt counts cannot overflow.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.retry_base_delay * 2u32.pow(exponent)
    }

    /// Execute all tool calls of one turn concurrently and merge their deltas.
    ///
    /// Tools see a consistent snapshot of pre-turn state; results are collected
    /// in request order (`join_all` preserves input order), so the bundle append
    /// order is deterministic regardless of completion order. Every call id is
    /// answered by exactly one tool-result message, including on failure and
    /// cancellation.
    async fn dispatch_tools(
        &self,
        state: &mut ConversationState,
        calls: &[ToolCall],
        deadline: Option<Instant>,
    ) -> Result<(), AgentError> {
        debug!(count = calls.len(), "Dispatching tool calls");

        let snapshot = state.clone();
        let dispatch = join_all(calls.iter().map(|call| self.tools.execute(call, &snapshot)));

        let results: Vec<Result<ToolOutcome, ToolError>> = match deadline {
            Some(d) => match tokio::time::timeout_at(d, dispatch).await {
                Ok(r) => r,
                Err(_) => {
                    // Keep the history replayable: every pending call gets an
                    // error result before cancellation surfaces.
                    for call in calls {
                        state.push(Message::tool_result(
                            &call.id,
                            "Error: invocation cancelled before this tool call completed",
                        ));
                    }
                    return Err(AgentError::Cancelled(
                        "deadline elapsed during tool dispatch".into(),
                    ));
                }
            },
            None => dispatch.await,
        };

        for (call, result) in calls.iter().zip(results) {
            match result {
                Ok(outcome) => {
                    debug!(tool = %call.name, "Tool call succeeded");
                    state.apply_outcome(&call.id, outcome);
                }
                Err(e) => {
                    warn!(tool = %call.name, error = %e, "Tool call failed");
                    state.push(Message::tool_result(&call.id, format!("Error: {e}")));
                }
            }
        }

        Ok(())
    }
}
