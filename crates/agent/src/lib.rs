//! # Planweave Agent
//!
//! The orchestration loop: call the chat model, inspect the response, either
//! stop, dispatch tools, or re-prompt, and repeat until the model produces a
//! final non-empty answer. Tool deltas are merged back into the conversation
//! state through the reducers in `planweave-core` before the next model call.

pub mod loop_runner;
pub mod prompt;

pub use loop_runner::AgentLoop;
pub use prompt::LEARNING_RESEARCHER;
