//! Core data model for the verdict research engine
//!
//! This crate holds the types shared by every other crate in the workspace:
//!
//! - [`Ticker`] validation and the [`SymbolDirectory`] seam
//! - The error taxonomy ([`ErrorKind`], [`VerdictError`])
//! - Market data shapes (headlines, price series, fundamentals, sentiment)
//! - [`AnalysisResult`] produced by the reasoning loop
//! - [`ProgressEvent`] and the non-blocking [`ProgressEmitter`]

pub mod analysis;
pub mod digest;
pub mod error;
pub mod market;
pub mod progress;
pub mod ticker;

pub use analysis::{AnalysisResult, InvocationOutcome, RunStatus, ToolCategory, ToolInvocation};
pub use digest::AnalysisDigest;
pub use error::{ErrorKind, Result, VerdictError};
pub use market::{
    Fundamentals, Headline, HeadlineSentiment, KeyTheme, PotentialImpact, PricePoint, PriceSeries,
    SentimentLabel, SentimentReport,
};
pub use progress::{EventStream, EventType, PartialData, ProgressEmitter, ProgressEvent};
pub use ticker::{KnownSymbols, SymbolDirectory, Ticker, TickerValidator};
