//! ChatModel trait — the abstraction over the LLM backend.
//!
//! A ChatModel knows how to send a conversation (plus a tool catalog) to an LLM
//! and get back either tool-call requests or a final message. It also exposes a
//! structured-extraction capability used by the update-plan tool.
//!
//! Implementations: Gemini (in `planweave-providers`), mocks in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::message::Message;

/// A request to the chat model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The conversation messages, system instructions first.
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.5
}

impl ChatRequest {
    /// A request with just messages and defaults for everything else.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            temperature: default_temperature(),
            max_tokens: None,
            tools: Vec::new(),
        }
    }
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete response from the chat model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The generated assistant message (text and/or tool calls).
    pub message: Message,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Token usage statistics
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The chat model collaborator.
///
/// The agent loop calls `complete()` without knowing which backend is in use;
/// the update-plan tool calls `extract()` for schema-constrained output.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// A human-readable name for this model backend (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: ChatRequest)
    -> std::result::Result<ChatResponse, ModelError>;

    /// Send a request constrained to a JSON schema and get the raw typed value.
    ///
    /// The caller deserializes the value into its target type; output that the
    /// backend cannot coerce into the schema is a `MalformedResponse`.
    async fn extract(
        &self,
        request: ChatRequest,
        schema: &serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_defaults() {
        let req = ChatRequest::new(vec![Message::user("hello")]);
        assert!((req.temperature - 0.5).abs() < f32::EPSILON);
        assert!(req.max_tokens.is_none());
        assert!(req.tools.is_empty());
    }

    #[test]
    fn tool_definition_serialization() {
        let tool = ToolDefinition {
            name: "web_research".into(),
            description: "Search the web".into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "queries": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["queries"]
            }),
        };
        let json = serde_json::to_string(&tool).unwrap();
        assert!(json.contains("web_research"));
        assert!(json.contains("queries"));
    }
}
