//! # Planweave Core
//!
//! Domain types, traits, and error definitions for the Planweave learning-plan
//! agent. This crate has **zero framework dependencies** — it defines the domain
//! model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The two external collaborators — the chat model and the search provider — are
//! defined as traits here. Implementations live in `planweave-providers`. The
//! conversation state is mutated only through the two reducers in [`state`],
//! which is what makes concurrent tool completions safe to merge.

pub mod error;
pub mod message;
pub mod model;
pub mod plan;
pub mod search;
pub mod state;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{AgentError, Error, ModelError, Result, SearchError, ToolError};
pub use message::{Message, MessageToolCall, Role};
pub use model::{ChatModel, ChatRequest, ChatResponse, ToolDefinition, Usage};
pub use plan::{Activity, LearningPlan, Resource, ResourceKind, WeekPlan};
pub use search::{SearchBundle, SearchDocument, SearchOptions, SearchProvider};
pub use state::{BundleDelta, ConversationState, merge_plan, merge_search_results};
pub use tool::{Tool, ToolCall, ToolOutcome, ToolRegistry};
