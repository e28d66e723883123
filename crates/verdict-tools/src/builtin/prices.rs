use crate::tool::parse_args;
use crate::{PriceSource, Result, Tool, ToolError, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use verdict_core::{Ticker, ToolCategory};
use verdict_llm::tools::schema;

const PERIODS: [&str; 6] = ["5d", "1mo", "3mo", "6mo", "1y", "2y"];

/// Fetch daily OHLCV history for a ticker
pub struct FetchPriceHistoryTool {
    source: Arc<dyn PriceSource>,
}

#[derive(Debug, Deserialize)]
struct PriceParams {
    ticker: String,
    #[serde(default = "default_period")]
    period: String,
}

fn default_period() -> String {
    "1mo".to_string()
}

impl FetchPriceHistoryTool {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Tool for FetchPriceHistoryTool {
    async fn invoke(&self, args: Value) -> Result<ToolOutput> {
        let params: PriceParams = parse_args(self.name(), args)?;
        let ticker = Ticker::parse(&params.ticker)?;
        if !PERIODS.contains(&params.period.as_str()) {
            return Err(ToolError::InvalidArguments {
                tool: self.name().to_string(),
                reason: format!("unsupported period '{}'", params.period),
            });
        }

        let series = self
            .source
            .fetch_price_history(&ticker, &params.period)
            .await
            .map_err(|e| ToolError::from_source("price source", ticker.as_str(), e))?;

        if series.is_empty() {
            return Err(ToolError::SourceFailed {
                source_name: "price source".to_string(),
                ticker: ticker.to_string(),
                reason: "empty price history".to_string(),
            });
        }
        Ok(ToolOutput::PriceSeries(series))
    }

    fn name(&self) -> &str {
        "fetch_price_history"
    }

    fn description(&self) -> &str {
        "Fetch daily open/high/low/close/volume history for a stock ticker."
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::PriceHistory
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "ticker": schema::string("Stock ticker symbol"),
                "period": schema::string_enum("History length (default 1mo)", &PERIODS),
            }),
            vec!["ticker"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockPriceSource;
    use verdict_core::PriceSeries;

    #[tokio::test]
    async fn test_default_period() {
        let mut source = MockPriceSource::new();
        source
            .expect_fetch_price_history()
            .withf(|_, period| period.to_string() == "1mo")
            .times(1)
            .returning(|t, p| Ok(crate::fixtures::trending_series(t.as_str(), p, 100.0, 10.0, 21)));

        let tool = FetchPriceHistoryTool::new(Arc::new(source));
        let output = tool.invoke(json!({"ticker": "AAPL"})).await.unwrap();
        assert!(matches!(output, ToolOutput::PriceSeries(s) if s.len() == 21));
    }

    #[tokio::test]
    async fn test_unsupported_period() {
        let tool = FetchPriceHistoryTool::new(Arc::new(MockPriceSource::new()));
        let err = tool
            .invoke(json!({"ticker": "AAPL", "period": "10y"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn test_empty_history_is_failure() {
        let mut source = MockPriceSource::new();
        source
            .expect_fetch_price_history()
            .returning(|t, p| Ok(PriceSeries::new(t.as_str(), p, vec![])));

        let tool = FetchPriceHistoryTool::new(Arc::new(source));
        assert!(tool.invoke(json!({"ticker": "AAPL"})).await.is_err());
    }
}
