//! Tool trait and typed tool output

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use verdict_core::{Headline, PartialData, PriceSeries, SentimentReport, ToolCategory};
use verdict_llm::ToolDefinition;

/// Payload a tool returns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ToolOutput {
    Headlines(Vec<Headline>),
    PriceSeries(PriceSeries),
    Sentiment(SentimentReport),
    Persisted { ticker: String, analysis_id: Uuid },
}

impl ToolOutput {
    /// One-line description recorded as a reasoning step
    pub fn describe(&self) -> String {
        match self {
            Self::Headlines(headlines) => format!("Fetched {} headlines", headlines.len()),
            Self::PriceSeries(series) => {
                let change = series
                    .change_pct()
                    .map(|c| format!(" ({c:+.1}% over {})", series.period))
                    .unwrap_or_default();
                format!("Fetched price data with {} data points{change}", series.len())
            }
            Self::Sentiment(report) => format!(
                "Completed structured sentiment analysis: {} (confidence: {:.0}%)",
                report.overall_sentiment,
                report.overall_confidence * 100.0
            ),
            Self::Persisted { ticker, .. } => format!("Saved analysis for {ticker}"),
        }
    }

    /// The partial result to attach to a progress event
    pub fn partial_data(&self) -> Option<PartialData> {
        match self {
            Self::Headlines(h) => Some(PartialData::Headlines(h.clone())),
            Self::PriceSeries(s) => Some(PartialData::PriceSeries(s.clone())),
            Self::Sentiment(r) => Some(PartialData::Sentiment(r.clone())),
            Self::Persisted { .. } => None,
        }
    }
}

/// An action the reasoning loop can take
///
/// Each tool declares its category; the loop invokes at most one tool per
/// category in a run.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Run the tool with arguments matching [`Tool::input_schema`]
    async fn invoke(&self, args: Value) -> Result<ToolOutput>;

    /// Unique name within a registry
    fn name(&self) -> &str;

    /// What the tool does, for the model
    fn description(&self) -> &str;

    fn category(&self) -> ToolCategory;

    /// JSON schema for the arguments
    fn input_schema(&self) -> Value;

    /// Definition handed to the model
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

/// Deserialize tool arguments, naming the tool on failure
pub(crate) fn parse_args<T: serde::de::DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| crate::ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use verdict_core::{PricePoint, SentimentLabel};

    #[test]
    fn test_describe_headlines() {
        let output = ToolOutput::Headlines(vec![Headline::new("a"), Headline::new("b")]);
        assert_eq!(output.describe(), "Fetched 2 headlines");
        assert!(matches!(output.partial_data(), Some(PartialData::Headlines(h)) if h.len() == 2));
    }

    #[test]
    fn test_describe_prices() {
        let bar = |d, close| PricePoint {
            date: NaiveDate::from_ymd_opt(2025, 3, d).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1,
        };
        let output = ToolOutput::PriceSeries(PriceSeries::new("AAPL", "1mo", vec![bar(1, 100.0), bar(2, 110.0)]));
        assert_eq!(
            output.describe(),
            "Fetched price data with 2 data points (+10.0% over 1mo)"
        );
    }

    #[test]
    fn test_describe_sentiment() {
        let mut report = SentimentReport::insufficient("none");
        report.overall_sentiment = SentimentLabel::Bullish;
        report.overall_confidence = 0.85;
        let text = ToolOutput::Sentiment(report).describe();
        assert!(text.contains("Bullish"));
        assert!(text.contains("85%"));
    }
}
