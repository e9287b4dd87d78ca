//! Tavily search provider implementation.
//!
//! One POST per query against the Tavily `/search` endpoint; the `content`
//! field of each result maps to our snippet, `raw_content` is requested only
//! when the options ask for it.

use async_trait::async_trait;
use planweave_core::error::SearchError;
use planweave_core::search::{SearchDocument, SearchOptions, SearchProvider};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.tavily.com";

/// A Tavily search backend.
pub struct TavilyClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl TavilyClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Override the API base URL (for proxies and tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchDocument>, SearchError> {
        let url = format!("{}/search", self.base_url);
        let body = ApiSearchRequest {
            api_key: &self.api_key,
            query,
            include_raw_content: options.include_raw_content,
            topic: &options.topic,
        };

        debug!(query = %query, topic = %options.topic, "Sending search request");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout(e.to_string())
                } else {
                    SearchError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Tavily returned error");
            return Err(SearchError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiSearchResponse = response.json().await.map_err(|e| {
            SearchError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            }
        })?;

        Ok(api_response
            .results
            .into_iter()
            .map(|r| SearchDocument {
                url: r.url,
                title: r.title,
                snippet: r.content,
                raw_content: r.raw_content,
                score: r.score,
            })
            .collect())
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
struct ApiSearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    include_raw_content: bool,
    topic: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiSearchResponse {
    #[serde(default)]
    results: Vec<ApiSearchResult>,
}

#[derive(Debug, Deserialize)]
struct ApiSearchResult {
    url: String,

    #[serde(default)]
    title: String,

    /// Tavily's relevance excerpt.
    #[serde(default)]
    content: String,

    #[serde(default)]
    raw_content: Option<String>,

    #[serde(default)]
    score: Option<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_maps_to_documents() {
        let api: ApiSearchResponse = serde_json::from_value(serde_json::json!({
            "query": "guitar chords for beginners",
            "results": [
                {
                    "url": "https://chords.example/a",
                    "title": "Open Chords",
                    "content": "The first chords to learn",
                    "raw_content": "Full lesson text...",
                    "score": 0.97
                },
                {
                    "url": "https://chords.example/b",
                    "title": "Barre Chords",
                    "content": "Moveable shapes"
                }
            ]
        }))
        .unwrap();

        assert_eq!(api.results.len(), 2);
        assert_eq!(api.results[0].title, "Open Chords");
        assert_eq!(api.results[0].raw_content.as_deref(), Some("Full lesson text..."));
        assert!(api.results[1].raw_content.is_none());
    }

    #[test]
    fn request_serializes_options() {
        let body = ApiSearchRequest {
            api_key: "key",
            query: "guitar practice schedule",
            include_raw_content: true,
            topic: "general",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["query"], "guitar practice schedule");
        assert_eq!(json["include_raw_content"], true);
        assert_eq!(json["topic"], "general");
    }

    #[test]
    fn empty_results_deserialize() {
        let api: ApiSearchResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(api.results.is_empty());
    }
}
