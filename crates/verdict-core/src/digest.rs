//! Condensed analysis view consumed by the kill-criteria monitor

use crate::SentimentLabel;
use serde::{Deserialize, Serialize};

/// The text a new analysis contributes for matching against kill criteria
///
/// Both the reasoning loop's result and a debate report can produce one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDigest {
    pub ticker: String,
    pub summary: String,
    pub sentiment: Option<SentimentLabel>,
    pub themes: Vec<String>,
    pub risks: Vec<String>,
    /// Headlines, decisive factors and other short statements
    pub highlights: Vec<String>,
}

impl AnalysisDigest {
    pub fn new(ticker: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            summary: summary.into(),
            ..Self::default()
        }
    }

    pub fn with_sentiment(mut self, sentiment: SentimentLabel) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    pub fn with_themes(mut self, themes: impl IntoIterator<Item = String>) -> Self {
        self.themes.extend(themes);
        self
    }

    pub fn with_risks(mut self, risks: impl IntoIterator<Item = String>) -> Self {
        self.risks.extend(risks);
        self
    }

    pub fn with_highlights(mut self, highlights: impl IntoIterator<Item = String>) -> Self {
        self.highlights.extend(highlights);
        self
    }
}
