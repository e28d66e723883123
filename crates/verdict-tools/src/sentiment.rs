//! Structured sentiment analysis over a batch of headlines

use crate::{Result, ToolError};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, instrument};
use verdict_core::{Headline, SentimentLabel, SentimentReport, Ticker};
use verdict_llm::tools::schema;
use verdict_llm::{CompletionRequest, Message, ModelProvider, PromptTemplate, complete_json};

const SYSTEM_PROMPT: &str = "You are a financial news analyst. Classify each headline as \
Bullish, Bearish or Neutral for the company's stock, identify recurring themes, risks and \
missing information, and answer with a single JSON document.";

const USER_TEMPLATE: &str = "Analyze the sentiment of these {{ headlines | length }} headlines about {{ ticker }}:
{% for h in headlines %}
{{ loop.index }}. {{ h.title }}{% if h.source %} ({{ h.source }}){% endif %}
{%- endfor %}

Return overall_sentiment, overall_confidence (0-1), bullish_count, bearish_count, neutral_count, \
headline_analyses, key_themes, potential_impact, risks_identified, information_gaps and summary.
Sentiment labels are Bullish, Bearish, Neutral or Insufficient Data; a theme's direction may also be Mixed. \
potential_impact is one of Strong Positive, Moderate Positive, Minimal, Moderate Negative, Strong Negative \
or Uncertain.";

/// Model-backed sentiment analyzer shared by the sentiment tool and the debate
#[derive(Clone)]
pub struct SentimentAnalyzer {
    provider: Arc<dyn ModelProvider>,
    model: String,
    max_tokens: usize,
}

impl SentimentAnalyzer {
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            max_tokens: 2048,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Analyze headlines; no headlines yields an "Insufficient Data" report
    /// without calling the model
    #[instrument(skip(self, headlines), fields(ticker = %ticker, count = headlines.len()))]
    pub async fn analyze(&self, ticker: &Ticker, headlines: &[Headline]) -> Result<SentimentReport> {
        if headlines.is_empty() {
            debug!("No headlines to analyze");
            return Ok(SentimentReport::insufficient("No headlines available"));
        }

        let template = PromptTemplate::new("sentiment", USER_TEMPLATE)?;
        let prompt = template.render(&json!({ "ticker": ticker, "headlines": headlines }))?;

        let request = CompletionRequest::builder(&self.model)
            .system(SYSTEM_PROMPT)
            .add_message(Message::user(prompt))
            .max_tokens(self.max_tokens)
            .temperature(0.1)
            .response_schema(report_schema())
            .purpose("sentiment")
            .build();

        let report: SentimentReport = complete_json(self.provider.as_ref(), request).await?;
        normalize(report)
    }
}

impl std::fmt::Debug for SentimentAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentAnalyzer")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .finish()
    }
}

/// Recount from per-headline analyses when the model left counts empty,
/// and reject out-of-range confidences
fn normalize(mut report: SentimentReport) -> Result<SentimentReport> {
    if !report.is_well_formed() {
        return Err(ToolError::InvalidOutput(
            "sentiment confidence outside [0, 1]".to_string(),
        ));
    }
    if report.classified() == 0 && !report.headline_analyses.is_empty() {
        for analysis in &report.headline_analyses {
            match analysis.sentiment {
                SentimentLabel::Bullish => report.bullish_count += 1,
                SentimentLabel::Bearish => report.bearish_count += 1,
                SentimentLabel::Neutral | SentimentLabel::Mixed | SentimentLabel::InsufficientData => {
                    report.neutral_count += 1;
                }
            }
        }
    }
    Ok(report)
}

fn report_schema() -> Value {
    let label = || schema::string_enum("Direction", &["Bullish", "Bearish", "Neutral"]);
    schema::object(
        json!({
            "overall_sentiment": schema::string_enum(
                "Overall direction",
                &["Bullish", "Bearish", "Neutral", "Insufficient Data"],
            ),
            "overall_confidence": schema::number("Confidence between 0 and 1"),
            "bullish_count": schema::integer("Bullish headlines"),
            "bearish_count": schema::integer("Bearish headlines"),
            "neutral_count": schema::integer("Neutral headlines"),
            "headline_analyses": schema::array("Per-headline verdicts", schema::object(
                json!({
                    "headline": schema::string("Headline text"),
                    "sentiment": label(),
                    "confidence": schema::number("Confidence between 0 and 1"),
                    "reasoning": schema::string("Why"),
                }),
                vec!["headline", "sentiment"],
            )),
            "key_themes": schema::array("Recurring themes", schema::object(
                json!({
                    "theme": schema::string("Theme name"),
                    "direction": schema::string_enum(
                        "Direction of the theme",
                        &["Bullish", "Bearish", "Mixed", "Neutral"],
                    ),
                    "headline_count": schema::integer("Headlines touching the theme"),
                    "summary": schema::string("One sentence"),
                }),
                vec!["theme", "direction"],
            )),
            "potential_impact": schema::string_enum(
                "Expected price impact",
                &[
                    "Strong Positive",
                    "Moderate Positive",
                    "Minimal",
                    "Moderate Negative",
                    "Strong Negative",
                    "Uncertain",
                ],
            ),
            "risks_identified": schema::array("Risks", schema::string("Risk")),
            "information_gaps": schema::array("Missing information", schema::string("Gap")),
            "summary": schema::string("Two or three sentences"),
        }),
        vec!["overall_sentiment", "overall_confidence"],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_llm::{ScriptedProvider, ScriptedReply};

    fn ticker() -> Ticker {
        Ticker::parse("AAPL").unwrap()
    }

    #[tokio::test]
    async fn test_empty_headlines_skip_model() {
        let provider = Arc::new(ScriptedProvider::new());
        let analyzer = SentimentAnalyzer::new(provider.clone(), "m");

        let report = analyzer.analyze(&ticker(), &[]).await.unwrap();
        assert_eq!(report.overall_sentiment, SentimentLabel::InsufficientData);
        assert_eq!(provider.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_counts_recomputed_from_analyses() {
        let provider = Arc::new(ScriptedProvider::new().reply_json(
            "sentiment",
            json!({
                "overall_sentiment": "Bullish",
                "overall_confidence": 0.8,
                "headline_analyses": [
                    {"headline": "Apple beats", "sentiment": "Bullish", "confidence": 0.9},
                    {"headline": "Apple flat", "sentiment": "Neutral", "confidence": 0.5}
                ]
            }),
        ));
        let analyzer = SentimentAnalyzer::new(provider.clone(), "m");

        let report = analyzer
            .analyze(&ticker(), &[Headline::new("Apple beats"), Headline::new("Apple flat")])
            .await
            .unwrap();
        assert_eq!(report.bullish_count, 1);
        assert_eq!(report.neutral_count, 1);

        let request = &provider.requests()[0];
        let prompt = request.messages[0].text().unwrap();
        assert!(prompt.contains("1. Apple beats"));
        assert!(prompt.contains("2 headlines about AAPL"));
    }

    #[tokio::test]
    async fn test_graded_impact_and_mixed_theme_accepted() {
        let provider = Arc::new(ScriptedProvider::new().reply_json(
            "sentiment",
            json!({
                "overall_sentiment": "Bullish",
                "overall_confidence": 0.7,
                "bullish_count": 2,
                "key_themes": [
                    {"theme": "AI Expansion", "sentiment_direction": "Mixed", "headline_count": 2}
                ],
                "potential_impact": "Moderate Positive"
            }),
        ));
        let analyzer = SentimentAnalyzer::new(provider.clone(), "m");

        let report = analyzer
            .analyze(&ticker(), &[Headline::new("Apple bets on AI"), Headline::new("AI spend worries")])
            .await
            .unwrap();
        assert_eq!(report.key_themes[0].direction, SentimentLabel::Mixed);
        assert_eq!(report.potential_impact, verdict_core::PotentialImpact::Positive);

        let schema = provider.requests()[0].response_schema.clone().unwrap();
        assert_eq!(
            schema["properties"]["potential_impact"]["enum"][1],
            "Moderate Positive"
        );
    }

    #[tokio::test]
    async fn test_out_of_range_confidence_rejected() {
        let provider = Arc::new(ScriptedProvider::new().reply_json(
            "sentiment",
            json!({"overall_sentiment": "Bullish", "overall_confidence": 1.7}),
        ));
        let analyzer = SentimentAnalyzer::new(provider, "m");
        let err = analyzer.analyze(&ticker(), &[Headline::new("x")]).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidOutput(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_propagates() {
        let provider = Arc::new(ScriptedProvider::new().reply("sentiment", ScriptedReply::RateLimited));
        let analyzer = SentimentAnalyzer::new(provider, "m");
        let err = analyzer.analyze(&ticker(), &[Headline::new("x")]).await.unwrap_err();
        assert!(matches!(err, ToolError::RateLimited(_)));
    }
}
