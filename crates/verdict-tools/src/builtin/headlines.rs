use crate::tool::parse_args;
use crate::{HeadlineSource, Result, Tool, ToolError, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use verdict_core::{Ticker, ToolCategory};
use verdict_llm::tools::schema;

/// Fetch recent headlines for a ticker
pub struct FetchHeadlinesTool {
    source: Arc<dyn HeadlineSource>,
    max_headlines: usize,
}

#[derive(Debug, Deserialize)]
struct HeadlinesParams {
    ticker: String,
    #[serde(default = "default_days")]
    days: u32,
}

fn default_days() -> u32 {
    7
}

impl FetchHeadlinesTool {
    pub fn new(source: Arc<dyn HeadlineSource>) -> Self {
        Self {
            source,
            max_headlines: 20,
        }
    }

    /// Cap on headlines passed downstream
    pub fn with_max_headlines(mut self, max: usize) -> Self {
        self.max_headlines = max;
        self
    }
}

#[async_trait]
impl Tool for FetchHeadlinesTool {
    async fn invoke(&self, args: Value) -> Result<ToolOutput> {
        let params: HeadlinesParams = parse_args(self.name(), args)?;
        let ticker = Ticker::parse(&params.ticker)?;

        let mut headlines = self
            .source
            .fetch_headlines(&ticker, params.days)
            .await
            .map_err(|e| ToolError::from_source("headline source", ticker.as_str(), e))?;
        headlines.truncate(self.max_headlines);

        Ok(ToolOutput::Headlines(headlines))
    }

    fn name(&self) -> &str {
        "fetch_headlines"
    }

    fn description(&self) -> &str {
        "Fetch recent news headlines for a stock ticker."
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Headlines
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "ticker": schema::string("Stock ticker symbol"),
                "days": schema::integer("How many days back to look (default 7)"),
            }),
            vec!["ticker"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{MockHeadlineSource, SourceError};
    use verdict_core::Headline;

    #[tokio::test]
    async fn test_fetch_and_truncate() {
        let mut source = MockHeadlineSource::new();
        source
            .expect_fetch_headlines()
            .withf(|ticker, days| ticker.as_str() == "AAPL" && *days == 7)
            .times(1)
            .returning(|_, _| Ok((0..5).map(|i| Headline::new(format!("h{i}"))).collect()));

        let tool = FetchHeadlinesTool::new(Arc::new(source)).with_max_headlines(3);
        let output = tool.invoke(json!({"ticker": "aapl"})).await.unwrap();
        assert!(matches!(output, ToolOutput::Headlines(h) if h.len() == 3));
    }

    #[tokio::test]
    async fn test_source_failure_is_tool_error() {
        let mut source = MockHeadlineSource::new();
        source
            .expect_fetch_headlines()
            .returning(|_, _| Err(SourceError::Unavailable("timeout".into())));

        let tool = FetchHeadlinesTool::new(Arc::new(source));
        let err = tool.invoke(json!({"ticker": "AAPL", "days": 3})).await.unwrap_err();
        assert!(matches!(err, ToolError::SourceFailed { .. }));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn test_bad_arguments() {
        let tool = FetchHeadlinesTool::new(Arc::new(MockHeadlineSource::new()));
        let err = tool.invoke(json!({"days": 3})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));

        let err = tool.invoke(json!({"ticker": "NOT A TICKER"})).await.unwrap_err();
        assert!(err.is_fatal());
    }
}
