//! Gemini chat model implementation.
//!
//! Talks to the Google Generative Language REST API (`generateContent`).
//! Supports tool use via function declarations and schema-constrained JSON
//! output for the `extract` capability.
//!
//! Gemini has no tool-call ids of its own: ids are minted on our side when a
//! function call comes back, and tool-result messages are matched back to
//! function names when the conversation is converted to API form.

use async_trait::async_trait;
use planweave_core::error::ModelError;
use planweave_core::message::{Message, MessageToolCall, Role};
use planweave_core::model::{ChatModel, ChatRequest, ChatResponse, ToolDefinition, Usage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// A Gemini chat model backend.
pub struct GeminiModel {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiModel {
    /// Create a new Gemini backend for the given model (e.g. "gemini-2.0-flash").
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            model: model.into(),
            client,
        }
    }

    /// Override the API base URL (for proxies and tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Split our message list into a system instruction and API contents.
    ///
    /// System messages fold into `systemInstruction`; tool-result messages
    /// become `functionResponse` parts under the "user" role, with the
    /// function name recovered from the assistant message that requested it.
    fn to_api_contents(messages: &[Message]) -> (Option<ApiSystemInstruction>, Vec<ApiContent>) {
        let mut system_text = String::new();
        let mut contents = Vec::new();
        let mut call_names: HashMap<String, String> = HashMap::new();

        for message in messages {
            match message.role {
                Role::System => {
                    if !system_text.is_empty() {
                        system_text.push('\n');
                    }
                    system_text.push_str(&message.content);
                }
                Role::User => contents.push(ApiContent {
                    role: "user".into(),
                    parts: vec![ApiPart::text(&message.content)],
                }),
                Role::Assistant => {
                    let mut parts = Vec::new();
                    if !message.content.is_empty() {
                        parts.push(ApiPart::text(&message.content));
                    }
                    for tc in &message.tool_calls {
                        call_names.insert(tc.id.clone(), tc.name.clone());
                        parts.push(ApiPart {
                            text: None,
                            function_call: Some(ApiFunctionCall {
                                name: tc.name.clone(),
                                args: serde_json::from_str(&tc.arguments)
                                    .unwrap_or(serde_json::Value::Null),
                            }),
                            function_response: None,
                        });
                    }
                    if parts.is_empty() {
                        parts.push(ApiPart::text(""));
                    }
                    contents.push(ApiContent {
                        role: "model".into(),
                        parts,
                    });
                }
                Role::Tool => {
                    let name = message
                        .tool_call_id
                        .as_ref()
                        .and_then(|id| call_names.get(id))
                        .cloned()
                        .unwrap_or_else(|| "unknown".into());
                    contents.push(ApiContent {
                        role: "user".into(),
                        parts: vec![ApiPart {
                            text: None,
                            function_call: None,
                            function_response: Some(ApiFunctionResponse {
                                name,
                                response: serde_json::json!({
                                    "content": message.content
                                }),
                            }),
                        }],
                    });
                }
            }
        }

        let system = if system_text.is_empty() {
            None
        } else {
            Some(ApiSystemInstruction {
                parts: vec![ApiPart::text(&system_text)],
            })
        };
        (system, contents)
    }

    fn to_api_tools(tools: &[ToolDefinition]) -> Vec<ApiTool> {
        if tools.is_empty() {
            return Vec::new();
        }
        vec![ApiTool {
            function_declarations: tools
                .iter()
                .map(|t| ApiFunctionDeclaration {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                })
                .collect(),
        }]
    }

    /// Convert a decoded API response into our ChatResponse.
    fn parse_response(
        api_response: ApiResponse,
        model: &str,
    ) -> Result<ChatResponse, ModelError> {
        let candidate = api_response.candidates.into_iter().next().ok_or_else(|| {
            ModelError::MalformedResponse("no candidates in response".into())
        })?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for part in candidate.content.parts {
            if let Some(text) = part.text {
                content.push_str(&text);
            }
            if let Some(fc) = part.function_call {
                tool_calls.push(MessageToolCall {
                    id: format!("call_{}", uuid::Uuid::new_v4()),
                    name: fc.name,
                    arguments: fc.args.to_string(),
                });
            }
        }

        let message = if tool_calls.is_empty() {
            Message::assistant(content)
        } else {
            Message::assistant_with_tool_calls(content, tool_calls)
        };

        let usage = api_response.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        Ok(ChatResponse {
            message,
            model: model.to_string(),
            usage,
        })
    }

    async fn generate(&self, body: serde_json::Value) -> Result<ApiResponse, ModelError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ModelError::Timeout(e.to_string())
                } else {
                    ModelError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(ModelError::RateLimited { retry_after_secs: 5 });
        }

        if status == 401 || status == 403 {
            return Err(ModelError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Gemini returned error");
            return Err(ModelError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        response.json().await.map_err(|e| {
            ModelError::MalformedResponse(format!("Failed to parse response: {e}"))
        })
    }

    fn base_body(&self, request: &ChatRequest) -> serde_json::Value {
        let (system, contents) = Self::to_api_contents(&request.messages);

        let mut generation_config = serde_json::json!({
            "temperature": request.temperature,
        });
        if let Some(max_tokens) = request.max_tokens {
            generation_config["maxOutputTokens"] = serde_json::json!(max_tokens);
        }

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": generation_config,
        });
        if let Some(system) = system {
            body["systemInstruction"] = serde_json::to_value(system).unwrap_or_default();
        }
        body
    }
}

#[async_trait]
impl ChatModel for GeminiModel {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ModelError> {
        let mut body = self.base_body(&request);
        if !request.tools.is_empty() {
            body["tools"] = serde_json::to_value(Self::to_api_tools(&request.tools))
                .unwrap_or_default();
        }

        debug!(model = %self.model, messages = request.messages.len(), "Sending completion request");

        let api_response = self.generate(body).await?;
        Self::parse_response(api_response, &self.model)
    }

    async fn extract(
        &self,
        request: ChatRequest,
        schema: &serde_json::Value,
    ) -> Result<serde_json::Value, ModelError> {
        let mut body = self.base_body(&request);
        body["generationConfig"]["responseMimeType"] = serde_json::json!("application/json");
        body["generationConfig"]["responseSchema"] = schema.clone();

        debug!(model = %self.model, "Sending structured extraction request");

        let api_response = self.generate(body).await?;
        let response = Self::parse_response(api_response, &self.model)?;

        serde_json::from_str(&response.message.content).map_err(|e| {
            ModelError::MalformedResponse(format!("structured output is not valid JSON: {e}"))
        })
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct ApiSystemInstruction {
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiContent {
    role: String,
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,

    #[serde(
        rename = "functionCall",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    function_call: Option<ApiFunctionCall>,

    #[serde(
        rename = "functionResponse",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    function_response: Option<ApiFunctionResponse>,
}

impl ApiPart {
    fn text(s: impl Into<String>) -> Self {
        Self {
            text: Some(s.into()),
            function_call: None,
            function_response: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    args: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ApiTool {
    #[serde(rename = "functionDeclarations")]
    function_declarations: Vec<ApiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct ApiFunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,

    #[serde(rename = "usageMetadata", default)]
    usage_metadata: Option<ApiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidate {
    content: ApiContent,
}

#[derive(Debug, Deserialize)]
struct ApiUsageMetadata {
    #[serde(rename = "promptTokenCount", default)]
    prompt_token_count: u32,

    #[serde(rename = "candidatesTokenCount", default)]
    candidates_token_count: u32,

    #[serde(rename = "totalTokenCount", default)]
    total_token_count: u32,
}
