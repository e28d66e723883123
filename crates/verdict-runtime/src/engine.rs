//! Loop driver
//!
//! One run: validate the ticker, then alternate think and act until the
//! state holds every required category, nothing attemptable remains, or the
//! iteration cap is hit. Tool calls are strictly sequential.

use crate::{AgentState, LoopConfig, LoopError, Planner, Result, SequentialPlanner};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use verdict_core::{
    AnalysisResult, EventType, InvocationOutcome, PartialData, ProgressEmitter, ProgressEvent,
    RunStatus, Ticker, TickerValidator, ToolCategory, ToolInvocation,
};
use verdict_tools::{
    AnalysisStore, AnalyzeSentimentTool, FetchHeadlinesTool, FetchPriceHistoryTool,
    HeadlineSource, PriceSource, SaveAnalysisTool, SentimentAnalyzer, ToolRegistry,
};

const TOOL_PROGRESS_START: f64 = 0.05;
const TOOL_PROGRESS_END: f64 = 0.95;

/// Outcome of a think phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Finish(RunStatus),
    Invoke(ToolCategory),
}

/// Reasoning-action loop over a tool registry
pub struct AnalysisEngine {
    registry: Arc<ToolRegistry>,
    planner: Arc<dyn Planner>,
    validator: TickerValidator,
    config: LoopConfig,
    store: Option<Arc<dyn AnalysisStore>>,
}

impl AnalysisEngine {
    pub fn builder() -> AnalysisEngineBuilder {
        AnalysisEngineBuilder::new()
    }

    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Run without an observer or cancellation
    pub async fn analyze(&self, ticker: &str) -> Result<AnalysisResult> {
        self.run(ticker, &ProgressEmitter::detached(), &CancellationToken::new())
            .await
    }

    /// Run the loop for a ticker
    ///
    /// Every failure closes the event stream with an error event naming the
    /// failure kind. Cancellation closes it silently.
    #[instrument(skip(self, emitter, cancel), fields(ticker = %raw_ticker))]
    pub async fn run(
        &self,
        raw_ticker: &str,
        emitter: &ProgressEmitter,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult> {
        match self.drive(raw_ticker, emitter, cancel).await {
            Ok(result) => Ok(result),
            Err(LoopError::Cancelled) => {
                info!("Analysis cancelled");
                emitter.close_silently();
                Err(LoopError::Cancelled)
            }
            Err(err) => {
                warn!(error = %err, kind = %err.kind(), "Analysis failed");
                emitter.fail(err.kind(), err.to_string());
                Err(err)
            }
        }
    }

    /// Last persisted result for a ticker, if the engine has a store
    pub async fn cached_result(&self, raw_ticker: &str) -> Result<Option<AnalysisResult>> {
        let ticker = Ticker::parse(raw_ticker)?;
        let Some(store) = &self.store else {
            return Ok(None);
        };
        store
            .load(&ticker)
            .await
            .map_err(|e| LoopError::Store(e.to_string()))
    }

    async fn drive(
        &self,
        raw_ticker: &str,
        emitter: &ProgressEmitter,
        cancel: &CancellationToken,
    ) -> Result<AnalysisResult> {
        let ticker = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(LoopError::Cancelled),
            validated = self.validator.validate(raw_ticker) => validated?,
        };

        emitter.emit(ProgressEvent::new(
            EventType::Started,
            0.0,
            format!("Starting analysis of {ticker}"),
        ));

        let mut state = AgentState::new(ticker);
        loop {
            let decision = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(LoopError::Cancelled),
                decision = self.think(&state) => decision,
            };

            let category = match decision {
                Decision::Finish(status) => return Ok(self.finish(&state, status, emitter)),
                Decision::Invoke(category) => category,
            };

            if state.iteration() >= self.config.max_iterations {
                warn!(
                    max_iterations = self.config.max_iterations,
                    pending = %category,
                    "Iteration cap reached"
                );
                let state = state.with_warning(format!(
                    "Iteration cap of {} reached before {category} was gathered",
                    self.config.max_iterations
                ));
                return Ok(self.finish(&state, RunStatus::IterationCapped, emitter));
            }

            state = self.act(state, category, emitter, cancel).await?;
        }
    }

    async fn think(&self, state: &AgentState) -> Decision {
        if state.has_required_data() {
            if self.persists() && !state.has_attempted(ToolCategory::Persistence) {
                return Decision::Invoke(ToolCategory::Persistence);
            }
            return Decision::Finish(RunStatus::Completed);
        }

        let candidates: Vec<ToolCategory> = ToolCategory::REQUIRED
            .into_iter()
            .filter(|c| !state.has_attempted(*c))
            .filter(|c| *c != ToolCategory::Sentiment || state.has_attempted(ToolCategory::Headlines))
            .collect();
        let Some(&fallback) = candidates.first() else {
            return Decision::Finish(RunStatus::Degraded);
        };
        if state.iteration() >= self.config.max_iterations {
            // The caller stops at the cap; the planner is not consulted
            return Decision::Invoke(fallback);
        }

        match self
            .planner
            .next_step(state, &candidates, &self.registry)
            .await
        {
            Ok(category) if candidates.contains(&category) => Decision::Invoke(category),
            Ok(category) => {
                debug!(requested = %category, next = %fallback, "Category already attempted, redirecting");
                Decision::Invoke(fallback)
            }
            Err(err) => {
                warn!(planner = self.planner.name(), error = %err, "Planner failed, using sequential order");
                Decision::Invoke(fallback)
            }
        }
    }

    async fn act(
        &self,
        state: AgentState,
        category: ToolCategory,
        emitter: &ProgressEmitter,
        cancel: &CancellationToken,
    ) -> Result<AgentState> {
        let tool = self
            .registry
            .for_category(category)
            .ok_or_else(|| LoopError::Config(format!("no tool registered for {category}")))?;
        let name = tool.name().to_string();
        let arguments =
            state.arguments_for(category, self.config.headline_days, &self.config.price_period);
        let slot = state.invocations().len();
        let iteration = state.iteration() + 1;

        info!(iteration, tool = %name, "Invoking tool");
        emitter.emit(
            ProgressEvent::new(
                EventType::ToolStarted,
                self.progress_at(slot),
                format!("Running {name}"),
            )
            .with_phase(&name),
        );

        let started = Instant::now();
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(LoopError::Cancelled),
            outcome = tool.invoke(arguments.clone()) => outcome,
        };
        let duration_ms = started.elapsed().as_millis() as u64;
        let done = self.progress_at(slot + 1);

        match outcome {
            Ok(output) => {
                let summary = output.describe();
                info!(tool = %name, duration_ms, summary = %summary, "Tool succeeded");

                let mut event = ProgressEvent::new(EventType::ToolCompleted, done, summary.clone())
                    .with_phase(&name);
                if let Some(data) = output.partial_data() {
                    event = event.with_data(data);
                }
                emitter.emit(event);

                let invocation = ToolInvocation {
                    tool: name,
                    category,
                    arguments,
                    outcome: InvocationOutcome::Success { summary },
                    iteration,
                    duration_ms,
                };
                Ok(state.record_success(invocation, output))
            }
            Err(err) if err.is_fatal() => Err(LoopError::Tool {
                tool: name,
                source: err,
            }),
            Err(err) => {
                warn!(tool = %name, duration_ms, error = %err, "Tool failed, continuing");
                emitter.emit(
                    ProgressEvent::new(EventType::ToolCompleted, done, format!("{name} failed: {err}"))
                        .with_phase(&name),
                );

                let invocation = ToolInvocation {
                    tool: name,
                    category,
                    arguments,
                    outcome: InvocationOutcome::Failure {
                        kind: err.kind(),
                        message: err.to_string(),
                    },
                    iteration,
                    duration_ms,
                };
                Ok(state.record_failure(invocation))
            }
        }
    }

    fn finish(&self, state: &AgentState, status: RunStatus, emitter: &ProgressEmitter) -> AnalysisResult {
        let result = state.to_result(status);
        info!(
            status = %status,
            iterations = result.iterations,
            tools = result.tools_used.len(),
            "Analysis finished"
        );
        emitter.emit(
            ProgressEvent::new(EventType::Completed, 1.0, result.summary.clone())
                .with_data(PartialData::Analysis(Box::new(result.clone()))),
        );
        result
    }

    fn persists(&self) -> bool {
        self.config.persist_results && self.registry.has_category(ToolCategory::Persistence)
    }

    /// Tool events are spread evenly over [0.05, 0.95]
    fn progress_at(&self, slot: usize) -> f64 {
        let slots = ToolCategory::REQUIRED.len() + usize::from(self.persists());
        let fraction = slot.min(slots) as f64 / slots as f64;
        TOOL_PROGRESS_START + (TOOL_PROGRESS_END - TOOL_PROGRESS_START) * fraction
    }
}

impl std::fmt::Debug for AnalysisEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisEngine")
            .field("planner", &self.planner.name())
            .field("tools", &self.registry.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for AnalysisEngine
pub struct AnalysisEngineBuilder {
    registry: Option<Arc<ToolRegistry>>,
    planner: Arc<dyn Planner>,
    validator: TickerValidator,
    config: LoopConfig,
    store: Option<Arc<dyn AnalysisStore>>,
}

impl AnalysisEngineBuilder {
    pub fn new() -> Self {
        Self {
            registry: None,
            planner: Arc::new(SequentialPlanner),
            validator: TickerValidator::format_only(),
            config: LoopConfig::default(),
            store: None,
        }
    }

    pub fn registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Register the four built-in tools over the given collaborators
    pub fn standard_tools(
        mut self,
        headlines: Arc<dyn HeadlineSource>,
        prices: Arc<dyn PriceSource>,
        analyzer: SentimentAnalyzer,
        store: Arc<dyn AnalysisStore>,
    ) -> Self {
        let registry = ToolRegistry::new()
            .with_tool(Arc::new(FetchHeadlinesTool::new(headlines)))
            .with_tool(Arc::new(FetchPriceHistoryTool::new(prices)))
            .with_tool(Arc::new(AnalyzeSentimentTool::new(analyzer)))
            .with_tool(Arc::new(SaveAnalysisTool::new(store.clone())));
        self.registry = Some(Arc::new(registry));
        self.store = Some(store);
        self
    }

    pub fn planner(mut self, planner: Arc<dyn Planner>) -> Self {
        self.planner = planner;
        self
    }

    pub fn validator(mut self, validator: TickerValidator) -> Self {
        self.validator = validator;
        self
    }

    pub fn config(mut self, config: LoopConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Read path for [`AnalysisEngine::cached_result`]
    pub fn store(mut self, store: Arc<dyn AnalysisStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the engine
    ///
    /// Fails when the configuration is invalid or a required category has no
    /// registered tool.
    pub fn build(self) -> Result<AnalysisEngine> {
        self.config
            .validate()
            .map_err(|e| LoopError::Config(e.to_string()))?;
        let registry = self
            .registry
            .ok_or_else(|| LoopError::Config("tool registry not set".to_string()))?;
        if let Some(missing) = ToolCategory::REQUIRED
            .iter()
            .find(|c| !registry.has_category(**c))
        {
            return Err(LoopError::Config(format!("no tool registered for {missing}")));
        }

        Ok(AnalysisEngine {
            registry,
            planner: self.planner,
            validator: self.validator,
            config: self.config,
            store: self.store,
        })
    }
}

impl Default for AnalysisEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::MockPlanner;
    use serde_json::json;
    use verdict_llm::ScriptedProvider;
    use verdict_tools::{CachedAnalysisStore, StaticMarketData};

    fn engine_with(provider: ScriptedProvider, planner: Arc<dyn Planner>, config: LoopConfig) -> AnalysisEngine {
        let data = Arc::new(StaticMarketData::demo());
        AnalysisEngine::builder()
            .standard_tools(
                data.clone(),
                data,
                SentimentAnalyzer::new(Arc::new(provider), "m"),
                Arc::new(CachedAnalysisStore::default()),
            )
            .planner(planner)
            .config(config)
            .build()
            .unwrap()
    }

    fn bullish() -> ScriptedProvider {
        ScriptedProvider::new().always(
            "sentiment",
            verdict_llm::ScriptedReply::Json(json!({
                "overall_sentiment": "Bullish",
                "overall_confidence": 0.8
            })),
        )
    }

    #[test]
    fn test_build_requires_core_tools() {
        let registry = Arc::new(ToolRegistry::new());
        let err = AnalysisEngine::builder().registry(registry).build().unwrap_err();
        assert!(matches!(err, LoopError::Config(_)));
        assert!(err.to_string().contains("headlines"));
    }

    #[test]
    fn test_build_validates_config() {
        let err = AnalysisEngine::builder().max_iterations(0).build().unwrap_err();
        assert!(matches!(err, LoopError::Config(_)));
        assert!(err.to_string().contains("max_iterations"));
    }

    #[test]
    fn test_progress_slots() {
        let engine = engine_with(bullish(), Arc::new(SequentialPlanner), LoopConfig::default());
        assert!((engine.progress_at(0) - 0.05).abs() < 1e-9);
        assert!((engine.progress_at(4) - 0.95).abs() < 1e-9);
        assert!((engine.progress_at(9) - 0.95).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_planner_asking_for_done_category_is_redirected() {
        let mut planner = MockPlanner::new();
        planner
            .expect_next_step()
            .returning(|_, _, _| Ok(ToolCategory::Headlines));
        planner.expect_name().return_const("stubborn".to_string());

        let engine = engine_with(bullish(), Arc::new(planner), LoopConfig::default());
        let result = engine.analyze("AAPL").await.unwrap();

        assert_eq!(result.status, RunStatus::Completed);
        for category in ToolCategory::REQUIRED {
            assert_eq!(result.invocations_of(category), 1);
        }
    }

    #[tokio::test]
    async fn test_planner_failure_falls_back_to_sequential() {
        let mut planner = MockPlanner::new();
        planner
            .expect_next_step()
            .times(3)
            .returning(|_, _, _| Err(LoopError::Planner("model down".into())));
        planner.expect_name().return_const("failing".to_string());

        let engine = engine_with(bullish(), Arc::new(planner), LoopConfig::default());
        let result = engine.analyze("AAPL").await.unwrap();

        let order: Vec<ToolCategory> = result.tools_used.iter().map(|t| t.category).collect();
        assert_eq!(
            order,
            vec![
                ToolCategory::Headlines,
                ToolCategory::PriceHistory,
                ToolCategory::Sentiment,
                ToolCategory::Persistence
            ]
        );
        assert!(result.warnings.is_empty());
    }

    #[tokio::test]
    async fn test_iteration_cap_returns_partial_result() {
        let config = LoopConfig::builder().max_iterations(2).build().unwrap();
        let engine = engine_with(bullish(), Arc::new(SequentialPlanner), config);
        let result = engine.analyze("AAPL").await.unwrap();

        assert_eq!(result.status, RunStatus::IterationCapped);
        assert!(result.incomplete);
        assert_eq!(result.iterations, 2);
        assert_eq!(result.invocations_of(ToolCategory::Sentiment), 0);
        assert!(!result.headlines.is_empty());
        assert!(result.price_data.is_some());
    }

    #[tokio::test]
    async fn test_persistence_skipped_when_disabled() {
        let config = LoopConfig::builder().persist_results(false).build().unwrap();
        let engine = engine_with(bullish(), Arc::new(SequentialPlanner), config);
        let result = engine.analyze("AAPL").await.unwrap();

        assert_eq!(result.iterations, 3);
        assert_eq!(result.invocations_of(ToolCategory::Persistence), 0);
        assert!(engine.cached_result("AAPL").await.unwrap().is_none());
    }
}
