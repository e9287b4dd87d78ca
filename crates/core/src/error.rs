//! Error types for the Planweave domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all Planweave operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Chat model errors ---
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    // --- Search provider errors ---
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Agent loop errors ---
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by model API, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
}

impl ModelError {
    /// Whether the agent loop should retry this failure.
    ///
    /// Rate limits, timeouts, network faults, and server-side (5xx) API errors
    /// are transient; auth failures and malformed responses are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Network(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::AuthenticationFailed(_) | Self::MalformedResponse(_) => false,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SearchError {
    #[error("Search API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Search request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    /// The model requested a tool name that is not in the catalog.
    /// Recovered as a tool-error message so the model can adapt.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),

    /// Structured extraction produced output that failed plan validation.
    #[error("Plan extraction failed: {0}")]
    Extraction(String),

    /// Every query in a research batch failed.
    #[error("Web search unavailable: {0}")]
    SearchUnavailable(String),
}

/// Loop-level failures that terminate the invocation.
///
/// Tool-level errors never reach this type — they are folded back into the
/// conversation as tool-result content.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Chat model unavailable after {attempts} attempts: {last_error}")]
    ModelUnavailable {
        attempts: u32,
        last_error: ModelError,
    },

    #[error("Model returned empty output {limit} times in a row")]
    SelfCorrectionExceeded { limit: u32 },

    #[error("Invocation cancelled: {0}")]
    Cancelled(String),
}
