//! Configuration loading and validation for Planweave.
//!
//! Loads settings from `planweave.toml` with environment variable overrides.
//! API keys are redacted from Debug output.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root settings structure.
///
/// Maps directly to `planweave.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Google Generative Language API key (env: `GEMINI_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_api_key: Option<String>,

    /// Tavily search API key (env: `TAVILY_API_KEY`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tavily_api_key: Option<String>,

    /// The chat model to use (env: `PLANWEAVE_MODEL`)
    #[serde(default = "default_model")]
    pub model: String,

    /// Sampling temperature for both chat and extraction calls
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per model response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Agent loop settings
    #[serde(default)]
    pub agent: AgentSettings,

    /// Research tool settings
    #[serde(default)]
    pub research: ResearchSettings,
}

fn default_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_temperature() -> f32 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    /// Maximum model-call attempts before giving up
    #[serde(default = "default_max_model_attempts")]
    pub max_model_attempts: u32,

    /// Maximum consecutive empty-response re-prompts
    #[serde(default = "default_max_self_corrections")]
    pub max_self_corrections: u32,

    /// Base delay for exponential retry backoff, in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Per-invocation deadline in seconds; absent = no deadline
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
}

fn default_max_model_attempts() -> u32 {
    3
}
fn default_max_self_corrections() -> u32 {
    3
}
fn default_retry_base_delay_ms() -> u64 {
    500
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_model_attempts: default_max_model_attempts(),
            max_self_corrections: default_max_self_corrections(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            deadline_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchSettings {
    /// Token budget per source in the formatted citation block
    #[serde(default = "default_max_tokens_per_source")]
    pub max_tokens_per_source: usize,

    /// Ask the search provider for full page content
    #[serde(default = "default_true")]
    pub include_raw_content: bool,

    /// Search topic hint sent to the provider
    #[serde(default = "default_topic")]
    pub topic: String,
}

fn default_max_tokens_per_source() -> usize {
    1000
}
fn default_true() -> bool {
    true
}
fn default_topic() -> String {
    "general".into()
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            max_tokens_per_source: default_max_tokens_per_source(),
            include_raw_content: true,
            topic: default_topic(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("tavily_api_key", &redact(&self.tavily_api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("agent", &self.agent)
            .field("research", &self.research)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            tavily_api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            agent: AgentSettings::default(),
            research: ResearchSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from `planweave.toml` in the current directory, with
    /// environment variable overrides:
    /// - `GEMINI_API_KEY`
    /// - `TAVILY_API_KEY`
    /// - `PLANWEAVE_MODEL`
    ///
    /// A set environment variable wins over the file value.
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Self::load_from(Path::new("planweave.toml"))?;
        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Apply environment overrides through a lookup function.
    fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(key) = get("GEMINI_API_KEY") {
            self.gemini_api_key = Some(key);
        }
        if let Some(key) = get("TAVILY_API_KEY") {
            self.tavily_api_key = Some(key);
        }
        if let Some(model) = get("PLANWEAVE_MODEL") {
            self.model = model;
        }
    }

    /// Load settings from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.agent.max_model_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_model_attempts must be at least 1".into(),
            ));
        }
        if self.research.max_tokens_per_source == 0 {
            return Err(ConfigError::ValidationError(
                "research.max_tokens_per_source must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
