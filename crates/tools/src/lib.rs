//! Agent tool implementations for Planweave.
//!
//! The catalog is a closed set of two capabilities:
//! - `update_learning_plan` — structured extraction of the plan document
//! - `web_research` — concurrent web search with deduplicated citations

pub mod sources;
pub mod update_plan;
pub mod web_research;

pub use sources::{dedup_documents, format_sources};
pub use update_plan::UpdatePlanTool;
pub use web_research::WebResearchTool;

use planweave_core::model::ChatModel;
use planweave_core::search::SearchProvider;
use planweave_core::tool::ToolRegistry;
use std::sync::Arc;

/// Create the default tool registry with both Planweave tools.
pub fn default_registry(
    model: Arc<dyn ChatModel>,
    search: Arc<dyn SearchProvider>,
    max_tokens_per_source: usize,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(UpdatePlanTool::new(model)));
    registry.register(Box::new(
        WebResearchTool::new(search).with_max_tokens_per_source(max_tokens_per_source),
    ));
    registry
}
