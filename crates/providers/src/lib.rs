//! Collaborator implementations for Planweave.
//!
//! - [`GeminiModel`] — the chat model, over the Google Generative Language API
//! - [`TavilyClient`] — the search provider, over the Tavily search API

pub mod gemini;
pub mod tavily;

pub use gemini::GeminiModel;
pub use tavily::TavilyClient;
