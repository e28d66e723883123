use crate::tool::parse_args;
use crate::{Result, SentimentAnalyzer, Tool, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use verdict_core::{Headline, Ticker, ToolCategory};
use verdict_llm::tools::schema;

/// Classify the sentiment of headlines already gathered in the run
pub struct AnalyzeSentimentTool {
    analyzer: SentimentAnalyzer,
}

#[derive(Debug, Deserialize)]
struct SentimentParams {
    ticker: String,
    #[serde(default)]
    headlines: Vec<Headline>,
}

impl AnalyzeSentimentTool {
    pub fn new(analyzer: SentimentAnalyzer) -> Self {
        Self { analyzer }
    }
}

#[async_trait]
impl Tool for AnalyzeSentimentTool {
    async fn invoke(&self, args: Value) -> Result<ToolOutput> {
        let params: SentimentParams = parse_args(self.name(), args)?;
        let ticker = Ticker::parse(&params.ticker)?;
        let report = self.analyzer.analyze(&ticker, &params.headlines).await?;
        Ok(ToolOutput::Sentiment(report))
    }

    fn name(&self) -> &str {
        "analyze_sentiment"
    }

    fn description(&self) -> &str {
        "Produce a structured sentiment verdict (Bullish/Bearish/Neutral) from fetched headlines. \
         Requires headlines to have been fetched first."
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Sentiment
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "ticker": schema::string("Stock ticker symbol"),
                "headlines": schema::array("Headlines to classify", json!({"type": "object"})),
            }),
            vec!["ticker"],
        )
    }
}
