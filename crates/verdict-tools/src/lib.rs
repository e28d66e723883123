//! Tool capability interface and built-in research tools
//!
//! The reasoning loop and the debate depend only on [`Tool::invoke`] and the
//! collaborator traits in [`sources`]. Built-in tools:
//!
//! - [`FetchHeadlinesTool`] - recent headlines for a ticker
//! - [`FetchPriceHistoryTool`] - daily OHLCV bars
//! - [`AnalyzeSentimentTool`] - structured sentiment verdict via the model
//! - [`SaveAnalysisTool`] - hands the finished result to persistence

pub mod builtin;
pub mod cache;
pub mod error;
pub mod fixtures;
pub mod registry;
pub mod sentiment;
pub mod sources;
pub mod tool;

pub use builtin::{AnalyzeSentimentTool, FetchHeadlinesTool, FetchPriceHistoryTool, SaveAnalysisTool};
pub use cache::CachedAnalysisStore;
pub use error::{Result, ToolError};
pub use fixtures::StaticMarketData;
pub use registry::ToolRegistry;
pub use sentiment::SentimentAnalyzer;
pub use sources::{AnalysisStore, FundamentalsSource, HeadlineSource, PriceSource, SourceError};
pub use tool::{Tool, ToolOutput};
