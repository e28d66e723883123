//! Wiring of data sources, the model and the engines

use crate::offline;
use anyhow::{Context as _, Result};
use std::sync::Arc;
use verdict_core::TickerValidator;
use verdict_debate::DebateOrchestrator;
use verdict_llm::providers::{OpenAIConfig, OpenAIProvider};
use verdict_llm::{ModelProvider, RateLimitedProvider};
use verdict_runtime::{AnalysisEngine, ModelPlanner, Planner, SequentialPlanner};
use verdict_tools::{CachedAnalysisStore, SentimentAnalyzer, StaticMarketData};
use verdict_utils::{AppConfig, ModelConfig};

/// Collaborators for one command
pub struct Backend {
    data: Arc<StaticMarketData>,
    provider: Arc<dyn ModelProvider>,
    offline: bool,
}

impl Backend {
    /// Market data always comes from the built-in universe; only the model
    /// differs between live and offline runs
    pub async fn connect(config: &AppConfig, offline: bool, ticker: &str) -> Result<Self> {
        let data = Arc::new(StaticMarketData::demo());
        let inner: Arc<dyn ModelProvider> = if offline {
            Arc::new(offline::scripted_model(ticker, &data).await)
        } else {
            live_provider(&config.model)?
        };
        let provider = RateLimitedProvider::per_minute(inner, config.model.requests_per_minute)
            .context("invalid model quota")?;

        Ok(Self {
            data,
            provider: Arc::new(provider),
            offline,
        })
    }

    pub fn analysis_engine(&self, config: &AppConfig) -> Result<AnalysisEngine> {
        let analyzer = SentimentAnalyzer::new(self.provider.clone(), config.model.model.clone())
            .with_max_tokens(config.model.max_tokens);
        let planner: Arc<dyn Planner> = if self.offline {
            Arc::new(SequentialPlanner)
        } else {
            Arc::new(
                ModelPlanner::new(self.provider.clone(), config.model.model.clone())
                    .with_max_tokens(config.model.max_tokens),
            )
        };

        let engine = AnalysisEngine::builder()
            .standard_tools(
                self.data.clone(),
                self.data.clone(),
                analyzer,
                Arc::new(CachedAnalysisStore::new(config.cache_ttl())),
            )
            .planner(planner)
            .validator(TickerValidator::with_directory(self.data.clone()))
            .config(config.analysis.clone())
            .build()?;
        Ok(engine)
    }

    pub fn debate_orchestrator(&self, config: &AppConfig) -> Result<DebateOrchestrator> {
        let orchestrator = DebateOrchestrator::builder()
            .market_data(self.data.clone())
            .provider(self.provider.clone())
            .validator(TickerValidator::with_directory(self.data.clone()))
            .config(config.debate.clone())
            .build()?;
        Ok(orchestrator)
    }
}

fn live_provider(config: &ModelConfig) -> Result<Arc<dyn ModelProvider>> {
    let api_key = config.api_key.clone().unwrap_or_else(|| "not-needed".to_string());
    let mut openai = OpenAIConfig::new(api_key).with_timeout(config.timeout_secs);
    if let Some(base) = &config.api_base {
        openai = openai.with_api_base(base);
    }
    let provider = OpenAIProvider::with_config(openai).context("failed to create model client")?;
    Ok(Arc::new(provider))
}
