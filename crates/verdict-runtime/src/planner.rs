//! Think-phase planners
//!
//! A planner only proposes the next tool category. The engine owns the
//! completeness rule and the dedupe rule, so a planner can never finish a
//! run early or repeat a category.

use crate::{AgentState, LoopError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use verdict_core::ToolCategory;
use verdict_llm::{CompletionRequest, ModelProvider, ToolDefinition};
use verdict_tools::ToolRegistry;

const PLANNER_SYSTEM_PROMPT: &str = "You are a market research agent. Decide which single tool \
to call next to finish researching the ticker. Fetch headlines before analyzing sentiment. \
Call exactly one tool.";

/// Proposes the next tool category
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Planner: Send + Sync {
    /// Pick one of `candidates`, which is never empty
    async fn next_step(
        &self,
        state: &AgentState,
        candidates: &[ToolCategory],
        registry: &ToolRegistry,
    ) -> Result<ToolCategory>;

    fn name(&self) -> &str;
}

/// Always takes the first candidate, giving the fixed
/// headlines, price history, sentiment order
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialPlanner;

#[async_trait]
impl Planner for SequentialPlanner {
    async fn next_step(
        &self,
        _state: &AgentState,
        candidates: &[ToolCategory],
        _registry: &ToolRegistry,
    ) -> Result<ToolCategory> {
        candidates
            .first()
            .copied()
            .ok_or_else(|| LoopError::Planner("no candidate tools".to_string()))
    }

    fn name(&self) -> &str {
        "sequential"
    }
}

/// Asks the model which tool to call next
pub struct ModelPlanner {
    provider: Arc<dyn ModelProvider>,
    model: String,
    max_tokens: usize,
}

impl ModelPlanner {
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 512,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl Planner for ModelPlanner {
    async fn next_step(
        &self,
        state: &AgentState,
        candidates: &[ToolCategory],
        registry: &ToolRegistry,
    ) -> Result<ToolCategory> {
        let tools: Vec<ToolDefinition> = registry
            .list_tools()
            .iter()
            .filter(|t| candidates.contains(&t.category()))
            .map(|t| t.definition())
            .collect();

        let request = CompletionRequest::builder(&self.model)
            .system(PLANNER_SYSTEM_PROMPT)
            .messages(state.history().to_vec())
            .tools(tools)
            .max_tokens(self.max_tokens)
            .temperature(0.0)
            .purpose("react.plan")
            .build();

        let response = self
            .provider
            .complete(request)
            .await
            .map_err(|e| LoopError::Planner(e.to_string()))?;

        let uses = response.message.tool_uses();
        let Some((_, name, _)) = uses.first() else {
            return Err(LoopError::Planner(
                "model answered without choosing a tool".to_string(),
            ));
        };
        debug!(tool = %name, "Model chose next tool");

        registry
            .get(name)
            .map(|tool| tool.category())
            .ok_or_else(|| LoopError::Planner(format!("model chose unknown tool '{name}'")))
    }

    fn name(&self) -> &str {
        "model"
    }
}

impl std::fmt::Debug for ModelPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelPlanner")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use verdict_core::Ticker;
    use verdict_llm::{ScriptedProvider, ScriptedReply};
    use verdict_tools::{FetchHeadlinesTool, FetchPriceHistoryTool, StaticMarketData};

    fn registry() -> ToolRegistry {
        let data = Arc::new(StaticMarketData::demo());
        ToolRegistry::new()
            .with_tool(Arc::new(FetchHeadlinesTool::new(data.clone())))
            .with_tool(Arc::new(FetchPriceHistoryTool::new(data)))
    }

    fn state() -> AgentState {
        AgentState::new(Ticker::parse("AAPL").unwrap())
    }

    #[tokio::test]
    async fn test_sequential_takes_first() {
        let step = SequentialPlanner
            .next_step(
                &state(),
                &[ToolCategory::PriceHistory, ToolCategory::Sentiment],
                &registry(),
            )
            .await
            .unwrap();
        assert_eq!(step, ToolCategory::PriceHistory);
    }

    #[tokio::test]
    async fn test_model_planner_maps_tool_to_category() {
        let provider = Arc::new(ScriptedProvider::new().reply(
            "react.plan",
            ScriptedReply::ToolCall {
                name: "fetch_price_history".into(),
                input: json!({"ticker": "AAPL"}),
            },
        ));
        let planner = ModelPlanner::new(provider.clone(), "m");
        let step = planner
            .next_step(
                &state(),
                &[ToolCategory::Headlines, ToolCategory::PriceHistory],
                &registry(),
            )
            .await
            .unwrap();

        assert_eq!(step, ToolCategory::PriceHistory);
        let request = &provider.requests()[0];
        assert_eq!(request.tools.as_ref().map(Vec::len), Some(2));
        assert_eq!(request.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_model_planner_rejects_text_answer() {
        let provider = Arc::new(ScriptedProvider::new().otherwise_text("I think we are done"));
        let err = ModelPlanner::new(provider, "m")
            .next_step(&state(), &[ToolCategory::Headlines], &registry())
            .await
            .unwrap_err();
        assert!(matches!(err, LoopError::Planner(_)));
    }

    #[tokio::test]
    async fn test_model_planner_rejects_unknown_tool() {
        let provider = Arc::new(ScriptedProvider::new().reply(
            "react.plan",
            ScriptedReply::ToolCall {
                name: "buy_stock".into(),
                input: json!({}),
            },
        ));
        let err = ModelPlanner::new(provider, "m")
            .next_step(&state(), &[ToolCategory::Headlines], &registry())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("buy_stock"));
    }
}
