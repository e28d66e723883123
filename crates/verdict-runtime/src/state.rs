//! Agent state carried between loop iterations
//!
//! Each act phase consumes the previous snapshot and returns a new one; the
//! loop never mutates a snapshot in place.

use chrono::Utc;
use serde_json::json;
use std::collections::BTreeSet;
use uuid::Uuid;
use verdict_core::{
    AnalysisResult, Headline, InvocationOutcome, PriceSeries, RunStatus, SentimentLabel,
    SentimentReport, Ticker, ToolCategory, ToolInvocation,
};
use verdict_llm::Message;
use verdict_tools::ToolOutput;

/// Snapshot of one run's progress
#[derive(Debug, Clone)]
pub struct AgentState {
    analysis_id: Uuid,
    ticker: Ticker,
    attempted: BTreeSet<ToolCategory>,
    headlines: Option<Vec<Headline>>,
    price_data: Option<PriceSeries>,
    sentiment: Option<SentimentReport>,
    persisted: bool,
    iteration: usize,
    history: Vec<Message>,
    reasoning_steps: Vec<String>,
    invocations: Vec<ToolInvocation>,
    warnings: Vec<String>,
}

impl AgentState {
    /// Fresh state with nothing attempted
    pub fn new(ticker: Ticker) -> Self {
        let opening = Message::user(format!(
            "Research {ticker}: gather recent headlines and price history, then classify the news sentiment."
        ));
        Self {
            analysis_id: Uuid::new_v4(),
            ticker,
            attempted: BTreeSet::new(),
            headlines: None,
            price_data: None,
            sentiment: None,
            persisted: false,
            iteration: 0,
            history: vec![opening],
            reasoning_steps: Vec::new(),
            invocations: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn analysis_id(&self) -> Uuid {
        self.analysis_id
    }

    /// Completed act phases
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Whether a tool of this category already ran, successfully or not
    pub fn has_attempted(&self, category: ToolCategory) -> bool {
        self.attempted.contains(&category)
    }

    /// Whether this category's output is in hand
    pub fn is_satisfied(&self, category: ToolCategory) -> bool {
        match category {
            ToolCategory::Headlines => self.headlines.is_some(),
            ToolCategory::PriceHistory => self.price_data.is_some(),
            ToolCategory::Sentiment => self.sentiment.is_some(),
            ToolCategory::Persistence => self.persisted,
        }
    }

    /// All required data plus a sentiment verdict
    pub fn has_required_data(&self) -> bool {
        ToolCategory::REQUIRED.iter().all(|c| self.is_satisfied(*c))
    }

    pub fn headlines(&self) -> &[Headline] {
        self.headlines.as_deref().unwrap_or_default()
    }

    pub fn price_data(&self) -> Option<&PriceSeries> {
        self.price_data.as_ref()
    }

    pub fn sentiment(&self) -> Option<&SentimentReport> {
        self.sentiment.as_ref()
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn invocations(&self) -> &[ToolInvocation] {
        &self.invocations
    }

    pub fn reasoning_steps(&self) -> &[String] {
        &self.reasoning_steps
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Fold a successful invocation and its output into a new snapshot
    pub fn record_success(mut self, invocation: ToolInvocation, output: ToolOutput) -> Self {
        let step = output.describe();
        self = self.record(invocation, &step, false);
        self.reasoning_steps.push(step);
        match output {
            ToolOutput::Headlines(headlines) => self.headlines = Some(headlines),
            ToolOutput::PriceSeries(series) => self.price_data = Some(series),
            ToolOutput::Sentiment(report) => self.sentiment = Some(report),
            ToolOutput::Persisted { .. } => self.persisted = true,
        }
        self
    }

    /// Fold a recoverable failure into a new snapshot
    pub fn record_failure(self, invocation: ToolInvocation) -> Self {
        let message = match &invocation.outcome {
            InvocationOutcome::Failure { message, .. } => message.clone(),
            InvocationOutcome::Success { summary } => summary.clone(),
        };
        let warning = format!("{} failed: {message}", invocation.tool);
        let mut next = self.record(invocation, &warning, true);
        next.warnings.push(warning);
        next
    }

    /// Add a warning without touching anything else
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    fn record(mut self, invocation: ToolInvocation, text: &str, is_error: bool) -> Self {
        let call_id = format!("call_{}", self.invocations.len() + 1);
        self.history.push(Message::tool_call(
            &call_id,
            &invocation.tool,
            invocation.arguments.clone(),
        ));
        self.history.push(Message::tool_result(call_id, text, is_error));
        self.attempted.insert(invocation.category);
        self.iteration += 1;
        self.invocations.push(invocation);
        self
    }

    /// Build a result from what the state holds
    pub fn to_result(&self, status: RunStatus) -> AnalysisResult {
        AnalysisResult {
            analysis_id: self.analysis_id,
            ticker: self.ticker.to_string(),
            status,
            incomplete: status != RunStatus::Completed,
            summary: self.summarize(status),
            overall_sentiment: self.sentiment.as_ref().map(|s| s.overall_sentiment),
            overall_confidence: self.sentiment.as_ref().map(|s| s.overall_confidence),
            sentiment: self.sentiment.clone(),
            headlines: self.headlines.clone().unwrap_or_default(),
            price_data: self.price_data.clone(),
            reasoning_steps: self.reasoning_steps.clone(),
            tools_used: self.invocations.clone(),
            iterations: self.iteration,
            warnings: self.warnings.clone(),
            generated_at: Utc::now(),
        }
    }

    /// Arguments for the tool serving a category
    pub fn arguments_for(&self, category: ToolCategory, days: u32, period: &str) -> serde_json::Value {
        match category {
            ToolCategory::Headlines => json!({ "ticker": self.ticker, "days": days }),
            ToolCategory::PriceHistory => json!({ "ticker": self.ticker, "period": period }),
            ToolCategory::Sentiment => json!({ "ticker": self.ticker, "headlines": self.headlines() }),
            ToolCategory::Persistence => json!({
                "ticker": self.ticker,
                "result": self.to_result(RunStatus::Completed),
            }),
        }
    }

    fn summarize(&self, status: RunStatus) -> String {
        let mut parts = Vec::new();
        match &self.sentiment {
            Some(report) if report.overall_sentiment != SentimentLabel::InsufficientData => {
                parts.push(format!(
                    "{} news sentiment is {} (confidence {:.0}%) across {} headlines.",
                    self.ticker,
                    report.overall_sentiment,
                    report.overall_confidence * 100.0,
                    self.headlines().len()
                ));
                if !report.summary.is_empty() {
                    parts.push(report.summary.clone());
                }
            }
            Some(_) => parts.push(format!(
                "Not enough news coverage to judge {} sentiment.",
                self.ticker
            )),
            None => parts.push(format!(
                "Sentiment analysis for {} is unavailable; showing {} headlines and price data only.",
                self.ticker,
                self.headlines().len()
            )),
        }
        if let Some(change) = self.price_data.as_ref().and_then(PriceSeries::change_pct) {
            let period = self.price_data.as_ref().map_or("", |p| p.period.as_str());
            parts.push(format!("Price moved {change:+.1}% over {period}."));
        }
        match status {
            RunStatus::Completed => {}
            RunStatus::IterationCapped => parts.push(format!(
                "Stopped after {} iterations before all data was gathered.",
                self.iteration
            )),
            RunStatus::Degraded => {
                let missing: Vec<&str> = ToolCategory::REQUIRED
                    .iter()
                    .filter(|c| !self.is_satisfied(**c))
                    .map(ToolCategory::as_str)
                    .collect();
                parts.push(format!("Partial analysis: missing {}.", missing.join(", ")));
            }
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::ErrorKind;
    use verdict_tools::fixtures::trending_series;

    fn invocation(category: ToolCategory, outcome: InvocationOutcome) -> ToolInvocation {
        ToolInvocation {
            tool: category.as_str().to_string(),
            category,
            arguments: json!({}),
            outcome,
            iteration: 1,
            duration_ms: 0,
        }
    }

    fn ok(category: ToolCategory) -> ToolInvocation {
        invocation(category, InvocationOutcome::Success { summary: "ok".into() })
    }

    #[test]
    fn test_success_is_folded_into_new_snapshot() {
        let state = AgentState::new(Ticker::parse("AAPL").unwrap());
        let before = state.clone();
        let next = state.record_success(
            ok(ToolCategory::Headlines),
            ToolOutput::Headlines(vec![Headline::new("Apple beats")]),
        );

        assert!(!before.has_attempted(ToolCategory::Headlines));
        assert_eq!(before.iteration(), 0);
        assert!(next.has_attempted(ToolCategory::Headlines));
        assert!(next.is_satisfied(ToolCategory::Headlines));
        assert_eq!(next.iteration(), 1);
        assert_eq!(next.reasoning_steps(), ["Fetched 1 headlines"]);
        assert_eq!(next.history().len(), 3);
    }

    #[test]
    fn test_failure_marks_attempted_but_not_satisfied() {
        let state = AgentState::new(Ticker::parse("AAPL").unwrap()).record_failure(invocation(
            ToolCategory::Sentiment,
            InvocationOutcome::Failure {
                kind: ErrorKind::RateLimited,
                message: "429".into(),
            },
        ));
        assert!(state.has_attempted(ToolCategory::Sentiment));
        assert!(!state.is_satisfied(ToolCategory::Sentiment));
        assert_eq!(state.warnings(), ["sentiment failed: 429"]);
    }

    #[test]
    fn test_degraded_result_is_flagged() {
        let state = AgentState::new(Ticker::parse("AAPL").unwrap())
            .record_success(
                ok(ToolCategory::Headlines),
                ToolOutput::Headlines(vec![Headline::new("a")]),
            )
            .record_success(
                ok(ToolCategory::PriceHistory),
                ToolOutput::PriceSeries(trending_series("AAPL", "1mo", 100.0, 10.0, 21)),
            );
        let result = state.to_result(RunStatus::Degraded);
        assert!(result.incomplete);
        assert!(result.summary.contains("unavailable"));
        assert!(result.summary.contains("missing sentiment"));
        assert!(result.summary.contains("+10.0%"));
    }

    #[test]
    fn test_sentiment_arguments_carry_headlines() {
        let state = AgentState::new(Ticker::parse("AAPL").unwrap()).record_success(
            ok(ToolCategory::Headlines),
            ToolOutput::Headlines(vec![Headline::new("Apple beats")]),
        );
        let args = state.arguments_for(ToolCategory::Sentiment, 7, "1mo");
        assert_eq!(args["ticker"], "AAPL");
        assert_eq!(args["headlines"][0]["title"], "Apple beats");
    }
}
