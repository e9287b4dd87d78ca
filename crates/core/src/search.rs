//! SearchProvider trait — the abstraction over the web search backend.
//!
//! The research tool issues one search per query and records the raw results;
//! deduplication happens later, at presentation time, so the raw history stays
//! retrievable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// One ranked search hit.
///
/// The URL is the identity key for deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub url: String,

    pub title: String,

    /// Short relevance excerpt, always shown in citations.
    pub snippet: String,

    /// Full page content when the provider returns it; truncated to the
    /// per-source token budget at formatting time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,

    /// Provider relevance score, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

/// The results of one query in a research batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchBundle {
    /// The query that produced these documents.
    pub query: String,

    /// Ranked documents, as returned by the provider.
    pub documents: Vec<SearchDocument>,
}

/// Options for a single search call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Ask the provider for full page content, not just snippets.
    pub include_raw_content: bool,

    /// Provider topic hint (e.g. "general", "news").
    pub topic: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            include_raw_content: true,
            topic: "general".into(),
        }
    }
}

/// The search collaborator.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// A human-readable name for this provider (e.g. "tavily").
    fn name(&self) -> &str;

    /// Run one query and return ranked documents.
    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> std::result::Result<Vec<SearchDocument>, SearchError>;
}
