//! External collaborators the tools delegate to
//!
//! How headlines, prices and fundamentals are fetched, and where analyses
//! are stored, is outside this workspace. Implementations plug in here.

use async_trait::async_trait;
use thiserror::Error;
use verdict_core::{AnalysisResult, Fundamentals, Headline, PriceSeries, Ticker};

/// Errors reported by a data source or store
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    #[error("No data for {0}")]
    NotFound(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Source rate limited: {0}")]
    RateLimited(String),
}

/// Recent news headlines
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn fetch_headlines(&self, ticker: &Ticker, days: u32) -> Result<Vec<Headline>, SourceError>;
}

/// Daily price history
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// `period` uses the usual shorthand: "5d", "1mo", "3mo", "1y"
    async fn fetch_price_history(&self, ticker: &Ticker, period: &str) -> Result<PriceSeries, SourceError>;
}

/// Company fundamentals
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    async fn fetch_fundamentals(&self, ticker: &Ticker) -> Result<Fundamentals, SourceError>;
}

/// Analysis persistence
///
/// `save` is fire-and-forget from the loop's point of view; `load` is the
/// read path for result-retrieval callers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn save(&self, ticker: &Ticker, result: &AnalysisResult) -> Result<(), SourceError>;

    async fn load(&self, ticker: &Ticker) -> Result<Option<AnalysisResult>, SourceError>;
}
