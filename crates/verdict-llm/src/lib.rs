//! Model capability layer for verdict
//!
//! The rest of the workspace talks to a language model only through
//! [`ModelProvider::complete`]. This crate provides:
//!
//! - Message and completion request/response types
//! - Structured-output extraction ([`structured`])
//! - Tool definitions for model-guided tool selection
//! - MiniJinja prompt templates ([`PromptTemplate`])
//! - A non-blocking client-side quota wrapper ([`RateLimitedProvider`])
//! - A scripted provider for tests and offline runs ([`ScriptedProvider`])
//! - An OpenAI-compatible HTTP provider (behind the `openai` feature)

pub mod completion;
pub mod error;
pub mod messages;
pub mod prompt;
pub mod provider;
pub mod rate_limit;
pub mod scripted;
pub mod structured;
pub mod tools;

pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{ModelError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use prompt::PromptTemplate;
pub use provider::{ModelProvider, complete_json};
pub use rate_limit::RateLimitedProvider;
pub use scripted::{ScriptedProvider, ScriptedReply};
pub use structured::ModelOutput;
pub use tools::ToolDefinition;

#[cfg(feature = "openai")]
pub mod providers;
