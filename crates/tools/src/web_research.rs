//! Web-research tool — concurrent query fan-out against the search provider.
//!
//! One search per query, all in flight at once, joined before the tool returns.
//! A failed query degrades to an empty bundle; the tool errors only when every
//! query in the batch fails. The raw per-query bundles go into the state while
//! the model sees the deduplicated, token-budgeted citation block.

use async_trait::async_trait;
use futures::future::join_all;
use planweave_core::error::ToolError;
use planweave_core::search::{SearchBundle, SearchOptions, SearchProvider};
use planweave_core::state::ConversationState;
use planweave_core::tool::{Tool, ToolOutcome};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::sources::{dedup_documents, format_sources};

/// The web research tool.
pub struct WebResearchTool {
    search: Arc<dyn SearchProvider>,
    options: SearchOptions,
    max_tokens_per_source: usize,
}

impl WebResearchTool {
    pub fn new(search: Arc<dyn SearchProvider>) -> Self {
        Self {
            search,
            options: SearchOptions::default(),
            max_tokens_per_source: 1000,
        }
    }

    /// Set the per-source token budget for the citation block.
    pub fn with_max_tokens_per_source(mut self, max: usize) -> Self {
        self.max_tokens_per_source = max;
        self
    }

    /// Set the search options sent with every query.
    pub fn with_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl Tool for WebResearchTool {
    fn name(&self) -> &str {
        "web_research"
    }

    fn description(&self) -> &str {
        "Executes concurrent web searches through a search engine optimized for \
         comprehensive, accurate, and trusted results. Useful when you need current \
         information; returns citation-backed results with titles, URLs, and content."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "queries": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "List of queries to look up"
                }
            },
            "required": ["queries"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        _state: &ConversationState,
    ) -> std::result::Result<ToolOutcome, ToolError> {
        let queries: Vec<String> = serde_json::from_value(arguments["queries"].clone())
            .map_err(|e| ToolError::InvalidArguments(format!("'queries' must be a string array: {e}")))?;
        if queries.is_empty() {
            return Err(ToolError::InvalidArguments(
                "'queries' must not be empty".into(),
            ));
        }

        debug!(provider = %self.search.name(), count = queries.len(), "Dispatching search batch");

        // Fan out one search per query; join_all keeps results in query order,
        // so the appended bundle order is deterministic.
        let searches = queries
            .iter()
            .map(|q| self.search.search(q, &self.options));
        let results = join_all(searches).await;

        let mut bundles = Vec::with_capacity(queries.len());
        let mut failures = 0usize;
        let mut last_error = String::new();
        for (query, result) in queries.iter().zip(results) {
            let documents = match result {
                Ok(docs) => docs,
                Err(e) => {
                    warn!(query = %query, error = %e, "Search query failed, degrading to empty result");
                    failures += 1;
                    last_error = e.to_string();
                    Vec::new()
                }
            };
            bundles.push(SearchBundle {
                query: query.clone(),
                documents,
            });
        }

        if failures == queries.len() {
            return Err(ToolError::SearchUnavailable(last_error));
        }

        let unique = dedup_documents(&bundles);
        let content = format_sources(
            &unique,
            self.max_tokens_per_source,
            self.options.include_raw_content,
        );

        Ok(ToolOutcome {
            content,
            plan: None,
            bundles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planweave_core::error::SearchError;
    use planweave_core::search::SearchDocument;
    use std::collections::HashMap;

    /// A mock provider with per-query scripted results.
    struct MockSearch {
        results: HashMap<String, Result<Vec<SearchDocument>, SearchError>>,
    }

    #[async_trait]
    impl SearchProvider for MockSearch {
        fn name(&self) -> &str {
            "mock"
        }

        async fn search(
            &self,
            query: &str,
            _options: &SearchOptions,
        ) -> Result<Vec<SearchDocument>, SearchError> {
            self.results
                .get(query)
                .cloned()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn doc(url: &str, title: &str) -> SearchDocument {
        SearchDocument {
            url: url.into(),
            title: title.into(),
            snippet: format!("Snippet for {title}"),
            raw_content: None,
            score: None,
        }
    }

    #[tokio::test]
    async fn batch_with_cross_query_duplicate() {
        // 2 queries, 2 documents each, one duplicate URL across queries:
        // raw bundles keep all 4 documents, citations show 3 unique entries.
        let mut results = HashMap::new();
        results.insert(
            "guitar chords for beginners".to_string(),
            Ok(vec![
                doc("https://chords.example/a", "Open Chords"),
                doc("https://shared.example/lesson", "First Lesson"),
            ]),
        );
        results.insert(
            "guitar practice schedule".to_string(),
            Ok(vec![
                doc("https://shared.example/lesson", "First Lesson (dup)"),
                doc("https://practice.example/b", "Practice Routines"),
            ]),
        );

        let tool = WebResearchTool::new(Arc::new(MockSearch { results }));
        let outcome = tool
            .execute(
                serde_json::json!({
                    "queries": ["guitar chords for beginners", "guitar practice schedule"]
                }),
                &ConversationState::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.bundles.len(), 2);
        let raw_docs: usize = outcome.bundles.iter().map(|b| b.documents.len()).sum();
        assert_eq!(raw_docs, 4);

        assert_eq!(outcome.content.matches("URL: ").count(), 3);
        // First-seen occurrence of the shared URL wins
        assert!(outcome.content.contains("First Lesson"));
        assert!(!outcome.content.contains("(dup)"));
    }

    #[tokio::test]
    async fn partial_failure_degrades_to_empty_bundle() {
        let mut results = HashMap::new();
        results.insert(
            "works".to_string(),
            Ok(vec![doc("https://a.example", "A")]),
        );
        results.insert(
            "broken".to_string(),
            Err(SearchError::Network("conn refused".into())),
        );

        let tool = WebResearchTool::new(Arc::new(MockSearch { results }));
        let outcome = tool
            .execute(
                serde_json::json!({"queries": ["works", "broken"]}),
                &ConversationState::new(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.bundles.len(), 2);
        assert_eq!(outcome.bundles[0].documents.len(), 1);
        assert!(outcome.bundles[1].documents.is_empty());
    }

    #[tokio::test]
    async fn all_queries_failing_is_search_unavailable() {
        let mut results = HashMap::new();
        results.insert(
            "q1".to_string(),
            Err(SearchError::Network("down".into())),
        );
        results.insert(
            "q2".to_string(),
            Err(SearchError::Timeout("30s".into())),
        );

        let tool = WebResearchTool::new(Arc::new(MockSearch { results }));
        let err = tool
            .execute(
                serde_json::json!({"queries": ["q1", "q2"]}),
                &ConversationState::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::SearchUnavailable(_)));
    }

    #[tokio::test]
    async fn empty_query_list_rejected() {
        let tool = WebResearchTool::new(Arc::new(MockSearch {
            results: HashMap::new(),
        }));
        let err = tool
            .execute(
                serde_json::json!({"queries": []}),
                &ConversationState::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn bundles_preserve_query_order() {
        let mut results = HashMap::new();
        results.insert("first".to_string(), Ok(vec![doc("https://1.example", "1")]));
        results.insert("second".to_string(), Ok(vec![doc("https://2.example", "2")]));
        results.insert("third".to_string(), Ok(vec![doc("https://3.example", "3")]));

        let tool = WebResearchTool::new(Arc::new(MockSearch { results }));
        let outcome = tool
            .execute(
                serde_json::json!({"queries": ["first", "second", "third"]}),
                &ConversationState::new(),
            )
            .await
            .unwrap();

        let order: Vec<&str> = outcome.bundles.iter().map(|b| b.query.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn tool_definition() {
        let tool = WebResearchTool::new(Arc::new(MockSearch {
            results: HashMap::new(),
        }));
        let def = tool.to_definition();
        assert_eq!(def.name, "web_research");
        assert!(def.parameters["required"][0] == "queries");
    }
}
