use crate::tool::parse_args;
use crate::{AnalysisStore, Result, Tool, ToolError, ToolOutput};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;
use verdict_core::{AnalysisResult, Ticker, ToolCategory};
use verdict_llm::tools::schema;

/// Hand a finished analysis to persistence
pub struct SaveAnalysisTool {
    store: Arc<dyn AnalysisStore>,
}

#[derive(Debug, Deserialize)]
struct SaveParams {
    ticker: String,
    result: AnalysisResult,
}

impl SaveAnalysisTool {
    pub fn new(store: Arc<dyn AnalysisStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SaveAnalysisTool {
    async fn invoke(&self, args: Value) -> Result<ToolOutput> {
        let params: SaveParams = parse_args(self.name(), args)?;
        let ticker = Ticker::parse(&params.ticker)?;

        self.store
            .save(&ticker, &params.result)
            .await
            .map_err(|e| ToolError::Persistence(e.to_string()))?;
        debug!(ticker = %ticker, analysis_id = %params.result.analysis_id, "Analysis saved");

        Ok(ToolOutput::Persisted {
            ticker: ticker.to_string(),
            analysis_id: params.result.analysis_id,
        })
    }

    fn name(&self) -> &str {
        "save_analysis"
    }

    fn description(&self) -> &str {
        "Persist the finished analysis so later callers can retrieve it. Call last."
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Persistence
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "ticker": schema::string("Stock ticker symbol"),
                "result": json!({"type": "object", "description": "The analysis result"}),
            }),
            vec!["ticker", "result"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{MockAnalysisStore, SourceError};
    use crate::CachedAnalysisStore;
    use std::time::Duration;

    #[tokio::test]
    async fn test_save_into_cache() {
        let store = Arc::new(CachedAnalysisStore::new(Duration::from_secs(60)));
        let tool = SaveAnalysisTool::new(store.clone());
        let result = crate::fixtures::sample_result("AAPL");

        let output = tool
            .invoke(json!({"ticker": "AAPL", "result": result}))
            .await
            .unwrap();
        assert!(matches!(output, ToolOutput::Persisted { ref ticker, .. } if ticker == "AAPL"));

        let loaded = store.load(&Ticker::parse("AAPL").unwrap()).await.unwrap();
        assert_eq!(loaded.unwrap().analysis_id, result.analysis_id);
    }

    #[tokio::test]
    async fn test_store_failure() {
        let mut store = MockAnalysisStore::new();
        store
            .expect_save()
            .returning(|_, _| Err(SourceError::Unavailable("disk full".into())));

        let tool = SaveAnalysisTool::new(Arc::new(store));
        let result = crate::fixtures::sample_result("AAPL");
        let err = tool
            .invoke(json!({"ticker": "AAPL", "result": result}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Persistence(_)));
    }
}
