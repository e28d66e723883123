//! Debate state machine
//!
//! `Started -> DataCollecting -> Drafting -> RebuttalRound -> Synthesizing ->
//! Completed | Failed`. Each transition emits its event before the work
//! starts, and the work finishes before the next transition. Drafting is
//! the only phase where the two sides run concurrently.

use crate::{
    Case, DebateAgent, DebateConfig, DebateError, Rebuttal, Result, Role, SharedData, Synthesizer,
    Verdict,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use verdict_core::{
    AnalysisDigest, EventType, PartialData, ProgressEmitter, ProgressEvent, Ticker,
    TickerValidator,
};
use verdict_llm::ModelProvider;
use verdict_tools::{FundamentalsSource, HeadlineSource, PriceSource, SentimentAnalyzer};

/// Debate lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebatePhase {
    Started,
    DataCollecting,
    Drafting,
    RebuttalRound,
    Synthesizing,
    Completed,
    Failed,
}

impl DebatePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::DataCollecting => "data_collecting",
            Self::Drafting => "drafting",
            Self::RebuttalRound => "rebuttal_round",
            Self::Synthesizing => "synthesizing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for DebatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a completed debate produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateReport {
    pub ticker: String,
    pub data: SharedData,
    pub bull_case: Case,
    pub bear_case: Case,
    pub rebuttals: Vec<Rebuttal>,
    pub verdict: Verdict,
    /// Data that could not be collected
    pub warnings: Vec<String>,
}

impl DebateReport {
    pub fn rebuttals_by(&self, author: Role) -> impl Iterator<Item = &Rebuttal> {
        self.rebuttals.iter().filter(move |r| r.author == author)
    }

    /// Condensed view used by the kill-criteria monitor
    pub fn digest(&self) -> AnalysisDigest {
        let verdict = &self.verdict;
        let summary = format!(
            "{} with {:.0}% bull / {:.0}% base / {:.0}% bear odds. {}",
            verdict.recommendation,
            verdict.probabilities.bull * 100.0,
            verdict.probabilities.base * 100.0,
            verdict.probabilities.bear * 100.0,
            verdict.synthesis_reasoning
        );
        let mut digest = AnalysisDigest::new(&self.ticker, summary);

        if let Some(report) = &self.data.sentiment {
            digest = digest
                .with_sentiment(report.overall_sentiment)
                .with_themes(report.key_themes.iter().map(|t| t.theme.clone()))
                .with_risks(report.risks_identified.iter().cloned());
        }
        digest
            .with_risks(self.bear_case.risks.iter().map(|r| r.description.clone()))
            .with_highlights(verdict.decisive_factors.iter().cloned())
            .with_highlights([self.bull_case.thesis.clone(), self.bear_case.thesis.clone()])
            .with_highlights(self.data.headlines.iter().map(|h| h.title.clone()))
    }
}

const FETCH_FUNDAMENTALS: &str = "fetch_fundamentals";
const FETCH_HEADLINES: &str = "fetch_headlines";
const FETCH_PRICES: &str = "fetch_price_history";
const ANALYZE_SENTIMENT: &str = "analyze_sentiment";

/// Runs one debate per call; holds no per-run state
pub struct DebateOrchestrator {
    headlines: Arc<dyn HeadlineSource>,
    prices: Arc<dyn PriceSource>,
    fundamentals: Arc<dyn FundamentalsSource>,
    analyzer: SentimentAnalyzer,
    bull: DebateAgent,
    bear: DebateAgent,
    synthesizer: Synthesizer,
    validator: TickerValidator,
    config: DebateConfig,
}

impl DebateOrchestrator {
    pub fn builder() -> DebateOrchestratorBuilder {
        DebateOrchestratorBuilder::default()
    }

    pub fn config(&self) -> &DebateConfig {
        &self.config
    }

    /// Run without an observer or cancellation
    pub async fn debate(&self, ticker: &str) -> Result<DebateReport> {
        self.run(ticker, &ProgressEmitter::detached(), &CancellationToken::new())
            .await
    }

    /// Run a full debate for a ticker
    ///
    /// Every failure closes the event stream with an error event naming the
    /// failure kind. Cancellation closes it silently.
    #[instrument(skip(self, emitter, cancel), fields(ticker = %raw_ticker))]
    pub async fn run(
        &self,
        raw_ticker: &str,
        emitter: &ProgressEmitter,
        cancel: &CancellationToken,
    ) -> Result<DebateReport> {
        match self.drive(raw_ticker, emitter, cancel).await {
            Ok(report) => Ok(report),
            Err(DebateError::Cancelled) => {
                info!("Debate cancelled");
                emitter.close_silently();
                Err(DebateError::Cancelled)
            }
            Err(err) => {
                warn!(error = %err, kind = %err.kind(), phase = %DebatePhase::Failed, "Debate failed");
                emitter.fail(err.kind(), err.to_string());
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        raw_ticker: &str,
        emitter: &ProgressEmitter,
        cancel: &CancellationToken,
    ) -> Result<DebateReport> {
        let ticker = cancellable(cancel, self.validator.validate(raw_ticker)).await??;

        emitter.emit(
            ProgressEvent::new(EventType::DebateStarted, 0.0, format!("Starting debate on {ticker}"))
                .with_phase(DebatePhase::Started.as_str()),
        );

        info!(phase = %DebatePhase::DataCollecting, "Collecting shared data");
        let (shared, warnings) = self.collect(ticker, emitter, cancel).await?;

        info!(phase = %DebatePhase::Drafting, "Drafting cases");
        for (event_type, role) in [(EventType::BullDrafting, Role::Bull), (EventType::BearDrafting, Role::Bear)] {
            emitter.emit(
                ProgressEvent::new(event_type, 0.30, format!("{role} analyst drafting"))
                    .with_phase(DebatePhase::Drafting.as_str()),
            );
        }
        let (bull_case, bear_case) = cancellable(cancel, async {
            tokio::try_join!(self.bull.draft_case(&shared), self.bear.draft_case(&shared))
        })
        .await??;
        emitter.emit(case_event(EventType::BullComplete, 0.50, &bull_case));
        emitter.emit(case_event(EventType::BearComplete, 0.55, &bear_case));

        info!(phase = %DebatePhase::RebuttalRound, "Exchanging rebuttals");
        emitter.emit(
            ProgressEvent::new(EventType::RebuttalRound, 0.60, "Rebuttal round")
                .with_phase(DebatePhase::RebuttalRound.as_str()),
        );
        let mut rebuttals = cancellable(cancel, self.bull.rebut(&bear_case, &bull_case)).await??;
        emitter.emit(
            ProgressEvent::new(
                EventType::Progress,
                0.75,
                format!("Bull issued {} rebuttals; bear responding", rebuttals.len()),
            )
            .with_phase(DebatePhase::RebuttalRound.as_str()),
        );
        rebuttals.extend(cancellable(cancel, self.bear.rebut(&bull_case, &bear_case)).await??);

        info!(phase = %DebatePhase::Synthesizing, rebuttals = rebuttals.len(), "Synthesizing verdict");
        emitter.emit(
            ProgressEvent::new(EventType::SynthesisStarted, 0.80, "Weighing the evidence")
                .with_phase(DebatePhase::Synthesizing.as_str()),
        );
        let verdict = self
            .synthesizer
            .synthesize(&bull_case, &bear_case, &rebuttals, &shared);

        let mut done = ProgressEvent::new(
            EventType::DebateCompleted,
            1.0,
            format!("{} ({:.2} conviction)", verdict.recommendation, verdict.conviction),
        )
        .with_phase(DebatePhase::Completed.as_str());
        if let Some(data) = structured("verdict", &verdict) {
            done = done.with_data(data);
        }
        emitter.emit(done);
        info!(recommendation = %verdict.recommendation, conviction = verdict.conviction, "Debate completed");

        Ok(DebateReport {
            ticker: shared.ticker.to_string(),
            data: shared,
            bull_case,
            bear_case,
            rebuttals,
            verdict,
            warnings,
        })
    }

    /// Gather the shared data; source failures become warnings
    async fn collect(
        &self,
        ticker: Ticker,
        emitter: &ProgressEmitter,
        cancel: &CancellationToken,
    ) -> Result<(SharedData, Vec<String>)> {
        let mut warnings = Vec::new();
        let mut shared = SharedData::new(ticker.clone());

        tool_started(emitter, FETCH_FUNDAMENTALS, 0.05, "Fetching fundamentals");
        match cancellable(cancel, self.fundamentals.fetch_fundamentals(&ticker)).await? {
            Ok(fundamentals) => {
                let message = format!("Fetched {} metrics", fundamentals.metrics.len());
                emitter.emit(
                    tool_completed(FETCH_FUNDAMENTALS, 0.08, message)
                        .with_data(PartialData::Fundamentals(fundamentals.clone())),
                );
                shared = shared.with_fundamentals(fundamentals);
            }
            Err(err) => {
                // ETFs and funds have no fundamentals
                warn!(error = %err, "Fundamentals unavailable, continuing without");
                warnings.push(format!("Fundamentals unavailable: {err}"));
                emitter.emit(tool_completed(FETCH_FUNDAMENTALS, 0.08, "Fundamentals unavailable"));
            }
        }

        tool_started(emitter, FETCH_HEADLINES, 0.08, "Fetching headlines");
        let days = self.config.headline_days;
        match cancellable(cancel, self.headlines.fetch_headlines(&ticker, days)).await? {
            Ok(headlines) => {
                let message = format!("Fetched {} headlines", headlines.len());
                emitter.emit(
                    tool_completed(FETCH_HEADLINES, 0.11, message)
                        .with_data(PartialData::Headlines(headlines.clone())),
                );
                shared = shared.with_headlines(headlines);
            }
            Err(err) => {
                warn!(error = %err, "Headlines unavailable, continuing without");
                warnings.push(format!("Headlines unavailable: {err}"));
                emitter.emit(tool_completed(FETCH_HEADLINES, 0.11, "Headlines unavailable"));
            }
        }

        tool_started(emitter, FETCH_PRICES, 0.11, "Fetching price history");
        let period = self.config.price_period.as_str();
        match cancellable(cancel, self.prices.fetch_price_history(&ticker, period)).await? {
            Ok(series) => {
                let message = format!("Fetched {} price points", series.len());
                emitter.emit(
                    tool_completed(FETCH_PRICES, 0.15, message)
                        .with_data(PartialData::PriceSeries(series.clone())),
                );
                shared = shared.with_price_data(series);
            }
            Err(err) => {
                warn!(error = %err, "Price history unavailable, continuing without");
                warnings.push(format!("Price history unavailable: {err}"));
                emitter.emit(tool_completed(FETCH_PRICES, 0.15, "Price history unavailable"));
            }
        }

        tool_started(emitter, ANALYZE_SENTIMENT, 0.18, "Analyzing headline sentiment");
        match cancellable(cancel, self.analyzer.analyze(&ticker, &shared.headlines)).await? {
            Ok(report) => {
                let message = format!(
                    "Sentiment {} ({:.0}%)",
                    report.overall_sentiment,
                    report.overall_confidence * 100.0
                );
                emitter.emit(
                    tool_completed(ANALYZE_SENTIMENT, 0.25, message)
                        .with_data(PartialData::Sentiment(report.clone())),
                );
                shared = shared.with_sentiment(report);
            }
            Err(err) if err.is_fatal() => {
                return Err(DebateError::Tool {
                    stage: "sentiment analysis".to_string(),
                    source: err,
                });
            }
            Err(err) => {
                warn!(error = %err, "Sentiment unavailable, continuing without");
                warnings.push(format!("Sentiment unavailable: {err}"));
                emitter.emit(tool_completed(ANALYZE_SENTIMENT, 0.25, "Sentiment unavailable"));
            }
        }

        Ok((shared, warnings))
    }
}

impl fmt::Debug for DebateOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebateOrchestrator")
            .field("bull", &self.bull)
            .field("bear", &self.bear)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for DebateOrchestrator
#[derive(Default)]
pub struct DebateOrchestratorBuilder {
    headlines: Option<Arc<dyn HeadlineSource>>,
    prices: Option<Arc<dyn PriceSource>>,
    fundamentals: Option<Arc<dyn FundamentalsSource>>,
    provider: Option<Arc<dyn ModelProvider>>,
    analyzer: Option<SentimentAnalyzer>,
    agents: Option<(DebateAgent, DebateAgent)>,
    validator: Option<TickerValidator>,
    config: Option<DebateConfig>,
}

impl DebateOrchestratorBuilder {
    /// Use one collaborator for headlines, prices and fundamentals
    pub fn market_data<S>(self, source: Arc<S>) -> Self
    where
        S: HeadlineSource + PriceSource + FundamentalsSource + 'static,
    {
        self.headline_source(source.clone())
            .price_source(source.clone())
            .fundamentals_source(source)
    }

    pub fn headline_source(mut self, source: Arc<dyn HeadlineSource>) -> Self {
        self.headlines = Some(source);
        self
    }

    pub fn price_source(mut self, source: Arc<dyn PriceSource>) -> Self {
        self.prices = Some(source);
        self
    }

    pub fn fundamentals_source(mut self, source: Arc<dyn FundamentalsSource>) -> Self {
        self.fundamentals = Some(source);
        self
    }

    /// Model used for sentiment, drafting and rebuttals unless overridden
    pub fn provider(mut self, provider: Arc<dyn ModelProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn analyzer(mut self, analyzer: SentimentAnalyzer) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn agents(mut self, bull: DebateAgent, bear: DebateAgent) -> Self {
        self.agents = Some((bull, bear));
        self
    }

    pub fn validator(mut self, validator: TickerValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn config(mut self, config: DebateConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<DebateOrchestrator> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let missing = |what: &str| DebateError::Config(format!("{what} is required"));
        let headlines = self.headlines.ok_or_else(|| missing("headline source"))?;
        let prices = self.prices.ok_or_else(|| missing("price source"))?;
        let fundamentals = self.fundamentals.ok_or_else(|| missing("fundamentals source"))?;

        let analyzer = match (self.analyzer, &self.provider) {
            (Some(analyzer), _) => analyzer,
            (None, Some(provider)) => SentimentAnalyzer::new(provider.clone(), &config.model),
            (None, None) => return Err(missing("model provider or sentiment analyzer")),
        };
        let (bull, bear) = match (self.agents, &self.provider) {
            (Some((bull, bear)), _) => (bull, bear),
            (None, Some(provider)) => (
                DebateAgent::from_config(Role::Bull, provider.clone(), &config),
                DebateAgent::from_config(Role::Bear, provider.clone(), &config),
            ),
            (None, None) => return Err(missing("model provider or debate agents")),
        };
        if bull.role() != Role::Bull || bear.role() != Role::Bear {
            return Err(DebateError::Config("agents must be given as (bull, bear)".to_string()));
        }

        let synthesizer = Synthesizer::new(config.grading.clone(), config.curve.clone(), config.scale.clone())
            .with_decisive_factor_count(config.decisive_factor_count);

        Ok(DebateOrchestrator {
            headlines,
            prices,
            fundamentals,
            analyzer,
            bull,
            bear,
            synthesizer,
            validator: self.validator.unwrap_or_default(),
            config,
        })
    }
}

/// Race a suspension point against cancellation
async fn cancellable<F: Future>(cancel: &CancellationToken, future: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(DebateError::Cancelled),
        output = future => Ok(output),
    }
}

fn tool_started(emitter: &ProgressEmitter, tool: &str, progress: f64, message: &str) {
    emitter.emit(ProgressEvent::new(EventType::ToolStarted, progress, message).with_phase(tool));
}

fn tool_completed(tool: &str, progress: f64, message: impl Into<String>) -> ProgressEvent {
    ProgressEvent::new(EventType::ToolCompleted, progress, message).with_phase(tool)
}

fn structured<T: Serialize>(shape: &str, value: &T) -> Option<PartialData> {
    serde_json::to_value(value)
        .ok()
        .map(|body| PartialData::Structured {
            shape: shape.to_string(),
            body,
        })
}

fn case_event(event_type: EventType, progress: f64, case: &Case) -> ProgressEvent {
    let message = if case.degraded {
        format!("{} case degraded", case.role)
    } else {
        format!("{} case ready with {} claims", case.role, case.claims.len())
    };
    let event = ProgressEvent::new(event_type, progress, message).with_phase(DebatePhase::Drafting.as_str());
    match structured(&format!("{}_case", case.role.as_str()), case) {
        Some(data) => event.with_data(data),
        None => event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use verdict_core::{ErrorKind, KnownSymbols};
    use verdict_llm::{ScriptedProvider, ScriptedReply};
    use verdict_tools::fixtures::StaticMarketData;

    fn sentiment() -> serde_json::Value {
        json!({"overall_sentiment": "Bullish", "overall_confidence": 0.8, "summary": "Upbeat"})
    }

    fn orchestrator(provider: Arc<ScriptedProvider>) -> DebateOrchestrator {
        DebateOrchestrator::builder()
            .market_data(Arc::new(StaticMarketData::demo()))
            .provider(provider)
            .validator(TickerValidator::with_directory(Arc::new(KnownSymbols::new(["AAPL", "TSLA"]))))
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_requires_sources() {
        let err = DebateOrchestrator::builder()
            .provider(Arc::new(ScriptedProvider::new()))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("headline source"));
    }

    #[tokio::test]
    async fn test_unknown_ticker_emits_single_error() {
        let provider = Arc::new(ScriptedProvider::new());
        let (emitter, stream) = ProgressEmitter::channel(32);
        let err = orchestrator(provider.clone())
            .run("XXXX", &emitter, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        let events = stream.collect_all().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::Error);
        assert_eq!(provider.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_sentiment_outage_fails_the_debate() {
        let provider = Arc::new(ScriptedProvider::new().reply("sentiment", ScriptedReply::Unavailable));
        let (emitter, stream) = ProgressEmitter::channel(32);
        let err = orchestrator(provider.clone())
            .run("AAPL", &emitter, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ModelUnavailable);
        assert_eq!(provider.calls("debate.bull.draft"), 0);
        let events = stream.collect_all().await;
        let last = events.last().unwrap();
        assert_eq!(last.event_type, EventType::Error);
        assert_eq!(last.phase.as_deref(), Some("model_unavailable"));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_is_silent() {
        let provider = Arc::new(ScriptedProvider::new().reply_json("sentiment", sentiment()));
        let (emitter, stream) = ProgressEmitter::channel(32);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = orchestrator(provider).run("AAPL", &emitter, &cancel).await.unwrap_err();
        assert!(matches!(err, DebateError::Cancelled));
        assert!(stream.collect_all().await.is_empty());
    }
}
