//! Market data shapes shared by tools, the reasoning loop and the debate

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A news headline about a ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    /// Headline text
    pub title: String,
    /// Publisher name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Publication time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Headline {
    /// Create a headline with only a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source: None,
            published_at: None,
            url: None,
        }
    }

    /// Set the publisher
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the publication time
    pub fn with_published_at(mut self, at: DateTime<Utc>) -> Self {
        self.published_at = Some(at);
        self
    }
}

/// One OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Daily price history for a ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    /// Ticker symbol
    pub ticker: String,
    /// Requested period, e.g. "1mo"
    pub period: String,
    /// Bars in ascending date order
    pub points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Create a series
    pub fn new(ticker: impl Into<String>, period: impl Into<String>, points: Vec<PricePoint>) -> Self {
        Self {
            ticker: ticker.into(),
            period: period.into(),
            points,
        }
    }

    /// Number of bars
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether there are no bars
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Close of the first bar
    pub fn first_close(&self) -> Option<f64> {
        self.points.first().map(|p| p.close)
    }

    /// Close of the last bar
    pub fn last_close(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }

    /// Percent change from first to last close
    pub fn change_pct(&self) -> Option<f64> {
        let first = self.first_close()?;
        let last = self.last_close()?;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first * 100.0)
    }

    /// Highest high over the period
    pub fn period_high(&self) -> Option<f64> {
        self.points.iter().map(|p| p.high).reduce(f64::max)
    }

    /// Lowest low over the period
    pub fn period_low(&self) -> Option<f64> {
        self.points.iter().map(|p| p.low).reduce(f64::min)
    }
}

/// Company fundamentals as a metric map
///
/// Ratios are stored as fractions (0.2 means 20%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    /// Metric name to value
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

impl Fundamentals {
    /// Set a metric
    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    /// Set the company name
    pub fn with_company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self
    }

    /// Set the sector
    pub fn with_sector(mut self, sector: impl Into<String>) -> Self {
        self.sector = Some(sector.into());
        self
    }

    /// Look up a metric
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

/// Directional sentiment label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SentimentLabel {
    #[serde(alias = "bullish", alias = "BULLISH")]
    Bullish,
    #[serde(alias = "bearish", alias = "BEARISH")]
    Bearish,
    #[serde(alias = "neutral", alias = "NEUTRAL")]
    Neutral,
    /// Signals pulling both ways; used for themes
    #[serde(alias = "mixed", alias = "MIXED")]
    Mixed,
    #[serde(rename = "Insufficient Data", alias = "InsufficientData", alias = "insufficient data")]
    InsufficientData,
}

impl SentimentLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bullish => "Bullish",
            Self::Bearish => "Bearish",
            Self::Neutral => "Neutral",
            Self::Mixed => "Mixed",
            Self::InsufficientData => "Insufficient Data",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected price impact of the news flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PotentialImpact {
    #[serde(rename = "Strong Positive")]
    StrongPositive,
    #[serde(alias = "Moderate Positive")]
    Positive,
    #[serde(alias = "Minimal")]
    Neutral,
    #[serde(alias = "Moderate Negative")]
    Negative,
    #[serde(rename = "Strong Negative")]
    StrongNegative,
    #[default]
    Uncertain,
}

/// Sentiment of a single headline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineSentiment {
    pub headline: String,
    pub sentiment: SentimentLabel,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// A recurring theme across headlines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyTheme {
    pub theme: String,
    #[serde(alias = "sentiment_direction")]
    pub direction: SentimentLabel,
    #[serde(default)]
    pub headline_count: usize,
    #[serde(default)]
    pub summary: String,
}

/// Structured sentiment verdict over a batch of headlines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    pub overall_sentiment: SentimentLabel,
    pub overall_confidence: f64,
    #[serde(default)]
    pub bullish_count: usize,
    #[serde(default)]
    pub bearish_count: usize,
    #[serde(default)]
    pub neutral_count: usize,
    #[serde(default)]
    pub headline_analyses: Vec<HeadlineSentiment>,
    #[serde(default)]
    pub key_themes: Vec<KeyTheme>,
    #[serde(default)]
    pub potential_impact: PotentialImpact,
    #[serde(default)]
    pub risks_identified: Vec<String>,
    #[serde(default)]
    pub information_gaps: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

impl SentimentReport {
    /// Report used when there is nothing to analyze
    pub fn insufficient(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            overall_sentiment: SentimentLabel::InsufficientData,
            overall_confidence: 0.0,
            bullish_count: 0,
            bearish_count: 0,
            neutral_count: 0,
            headline_analyses: Vec::new(),
            key_themes: Vec::new(),
            potential_impact: PotentialImpact::Uncertain,
            risks_identified: Vec::new(),
            information_gaps: vec![reason.clone()],
            summary: reason,
        }
    }

    /// Total classified headlines
    pub fn classified(&self) -> usize {
        self.bullish_count + self.bearish_count + self.neutral_count
    }

    /// Check the confidence fields are inside [0, 1]
    pub fn is_well_formed(&self) -> bool {
        (0.0..=1.0).contains(&self.overall_confidence)
            && self
                .headline_analyses
                .iter()
                .all(|h| (0.0..=1.0).contains(&h.confidence))
    }
}
