//! Reasoning loop output and its invocation log

use crate::{
    AnalysisDigest, ErrorKind, Headline, PriceSeries, SentimentLabel, SentimentReport,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Category a tool belongs to; each is invoked at most once per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    Headlines,
    PriceHistory,
    Sentiment,
    Persistence,
}

impl ToolCategory {
    /// Data categories that must be present before a run can finish
    pub const REQUIRED: [Self; 3] = [Self::Headlines, Self::PriceHistory, Self::Sentiment];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Headlines => "headlines",
            Self::PriceHistory => "price_history",
            Self::Sentiment => "sentiment",
            Self::Persistence => "persistence",
        }
    }
}

impl fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvocationOutcome {
    Success { summary: String },
    Failure { kind: ErrorKind, message: String },
}

/// A recorded tool call; immutable once pushed onto the log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool: String,
    pub category: ToolCategory,
    pub arguments: Value,
    pub outcome: InvocationOutcome,
    /// Iteration the call ran in, starting at 1
    pub iteration: usize,
    pub duration_ms: u64,
}

impl ToolInvocation {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, InvocationOutcome::Success { .. })
    }
}

/// How a reasoning run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// All required data and a sentiment verdict were gathered
    Completed,
    /// The iteration cap forced a stop
    IterationCapped,
    /// A required category could not be obtained
    Degraded,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Completed => "completed",
            Self::IterationCapped => "iteration_capped",
            Self::Degraded => "degraded",
        })
    }
}

/// Result of a reasoning-action run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis_id: Uuid,
    pub ticker: String,
    pub status: RunStatus,
    /// Set whenever `status` is not `Completed`
    pub incomplete: bool,
    pub summary: String,
    pub overall_sentiment: Option<SentimentLabel>,
    pub overall_confidence: Option<f64>,
    pub sentiment: Option<SentimentReport>,
    pub headlines: Vec<Headline>,
    pub price_data: Option<PriceSeries>,
    pub reasoning_steps: Vec<String>,
    pub tools_used: Vec<ToolInvocation>,
    pub iterations: usize,
    pub warnings: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisResult {
    /// Invocations recorded for a category
    pub fn invocations_of(&self, category: ToolCategory) -> usize {
        self.tools_used
            .iter()
            .filter(|inv| inv.category == category)
            .count()
    }

    /// Condensed view used by the kill-criteria monitor
    pub fn digest(&self) -> AnalysisDigest {
        let mut digest = AnalysisDigest::new(&self.ticker, &self.summary);
        if let Some(report) = &self.sentiment {
            digest = digest
                .with_sentiment(report.overall_sentiment)
                .with_themes(report.key_themes.iter().map(|t| {
                    if t.summary.is_empty() {
                        t.theme.clone()
                    } else {
                        format!("{}: {}", t.theme, t.summary)
                    }
                }))
                .with_risks(report.risks_identified.iter().cloned());
        }
        digest.with_highlights(self.headlines.iter().map(|h| h.title.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeyTheme, PotentialImpact};
    use serde_json::json;

    fn invocation(category: ToolCategory) -> ToolInvocation {
        ToolInvocation {
            tool: category.as_str().to_string(),
            category,
            arguments: json!({}),
            outcome: InvocationOutcome::Success {
                summary: "ok".to_string(),
            },
            iteration: 1,
            duration_ms: 3,
        }
    }

    fn result() -> AnalysisResult {
        AnalysisResult {
            analysis_id: Uuid::new_v4(),
            ticker: "AAPL".to_string(),
            status: RunStatus::Completed,
            incomplete: false,
            summary: "Apple looks strong.".to_string(),
            overall_sentiment: Some(SentimentLabel::Bullish),
            overall_confidence: Some(0.8),
            sentiment: Some(SentimentReport {
                overall_sentiment: SentimentLabel::Bullish,
                overall_confidence: 0.8,
                bullish_count: 1,
                bearish_count: 0,
                neutral_count: 0,
                headline_analyses: vec![],
                key_themes: vec![KeyTheme {
                    theme: "Services growth".to_string(),
                    direction: SentimentLabel::Bullish,
                    headline_count: 1,
                    summary: "Services revenue at record".to_string(),
                }],
                potential_impact: PotentialImpact::Positive,
                risks_identified: vec!["China demand".to_string()],
                information_gaps: vec![],
                summary: String::new(),
            }),
            headlines: vec![Headline::new("Apple beats estimates")],
            price_data: None,
            reasoning_steps: vec!["Fetched 1 headlines".to_string()],
            tools_used: vec![invocation(ToolCategory::Headlines), invocation(ToolCategory::Sentiment)],
            iterations: 2,
            warnings: vec![],
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_invocation_counts() {
        let result = result();
        assert_eq!(result.invocations_of(ToolCategory::Headlines), 1);
        assert_eq!(result.invocations_of(ToolCategory::Persistence), 0);
    }

    #[test]
    fn test_digest_collects_signals() {
        let digest = result().digest();
        assert_eq!(digest.ticker, "AAPL");
        assert_eq!(digest.sentiment, Some(SentimentLabel::Bullish));
        assert_eq!(digest.themes, vec!["Services growth: Services revenue at record".to_string()]);
        assert_eq!(digest.risks, vec!["China demand".to_string()]);
        assert_eq!(digest.highlights, vec!["Apple beats estimates".to_string()]);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = InvocationOutcome::Failure {
            kind: ErrorKind::Tool,
            message: "timeout".to_string(),
        };
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["status"], "failure");
        assert_eq!(value["kind"], "tool_error");
    }
}
