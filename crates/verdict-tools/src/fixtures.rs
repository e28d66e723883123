//! In-memory market data for tests and offline runs

use crate::sources::{FundamentalsSource, HeadlineSource, PriceSource, SourceError};
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use std::collections::HashMap;
use uuid::Uuid;
use verdict_core::{
    AnalysisResult, Fundamentals, Headline, KeyTheme, PotentialImpact, PricePoint, PriceSeries,
    RunStatus, SentimentLabel, SentimentReport, SymbolDirectory, Ticker,
};

/// Fixed headlines, prices and fundamentals per ticker
#[derive(Debug, Clone, Default)]
pub struct StaticMarketData {
    headlines: HashMap<String, Vec<Headline>>,
    prices: HashMap<String, PriceSeries>,
    fundamentals: HashMap<String, Fundamentals>,
}

impl StaticMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_headlines<I, S>(mut self, ticker: &str, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headlines.insert(
            ticker.to_string(),
            titles.into_iter().map(Headline::new).collect(),
        );
        self
    }

    pub fn with_prices(mut self, ticker: &str, series: PriceSeries) -> Self {
        self.prices.insert(ticker.to_string(), series);
        self
    }

    pub fn with_fundamentals(mut self, ticker: &str, fundamentals: Fundamentals) -> Self {
        self.fundamentals.insert(ticker.to_string(), fundamentals);
        self
    }

    /// A small universe used by the offline CLI mode
    pub fn demo() -> Self {
        Self::new()
            .with_headlines(
                "AAPL",
                [
                    "Apple beats quarterly earnings estimates on record services revenue",
                    "Analysts upgrade Apple to buy citing iPhone demand",
                    "Apple unveils new AI features, shares climb",
                    "Apple expands manufacturing in India to meet demand",
                    "Apple's wearables business posts strong growth",
                    "Apple announces $110 billion share buyback",
                    "Apple gains market share in China smartphone market",
                    "Apple services subscriptions hit all-time high",
                ],
            )
            .with_prices("AAPL", trending_series("AAPL", "1mo", 200.0, 10.0, 21))
            .with_fundamentals(
                "AAPL",
                Fundamentals::default()
                    .with_company_name("Apple Inc.")
                    .with_sector("Technology")
                    .with_metric("revenue_growth", 0.061)
                    .with_metric("market_cap", 3.4e12)
                    .with_metric("forward_pe", 28.5)
                    .with_metric("recommendation_mean", 2.0)
                    .with_metric("target_high", 275.0)
                    .with_metric("target_mean", 245.0)
                    .with_metric("debt_to_equity", 1.45)
                    .with_metric("profit_margins", 0.243)
                    .with_metric("pe_ratio", 33.1)
                    .with_metric("price_to_book", 48.0)
                    .with_metric("current_ratio", 0.87)
                    .with_metric("quick_ratio", 0.83),
            )
            .with_headlines(
                "TSLA",
                [
                    "Tesla recalls 120,000 vehicles over seat belt issue",
                    "Tesla deliveries miss analyst expectations",
                    "Tesla cuts prices again as EV competition intensifies",
                    "Regulators widen probe into Tesla driver assistance",
                    "Tesla energy storage deployments reach record",
                    "Tesla CFO steps down after four years",
                ],
            )
            .with_prices("TSLA", trending_series("TSLA", "1mo", 250.0, -8.0, 21))
            .with_fundamentals(
                "TSLA",
                Fundamentals::default()
                    .with_company_name("Tesla, Inc.")
                    .with_sector("Consumer Cyclical")
                    .with_metric("revenue_growth", -0.09)
                    .with_metric("forward_pe", 85.0)
                    .with_metric("debt_to_equity", 0.18)
                    .with_metric("profit_margins", 0.07)
                    .with_metric("pe_ratio", 95.0)
                    .with_metric("current_ratio", 1.84),
            )
    }

    fn tickers(&self) -> impl Iterator<Item = &String> {
        self.headlines
            .keys()
            .chain(self.prices.keys())
            .chain(self.fundamentals.keys())
    }
}

#[async_trait]
impl HeadlineSource for StaticMarketData {
    async fn fetch_headlines(&self, ticker: &Ticker, _days: u32) -> Result<Vec<Headline>, SourceError> {
        self.headlines
            .get(ticker.as_str())
            .cloned()
            .ok_or_else(|| SourceError::NotFound(ticker.to_string()))
    }
}

#[async_trait]
impl PriceSource for StaticMarketData {
    async fn fetch_price_history(&self, ticker: &Ticker, period: &str) -> Result<PriceSeries, SourceError> {
        let mut series = self
            .prices
            .get(ticker.as_str())
            .cloned()
            .ok_or_else(|| SourceError::NotFound(ticker.to_string()))?;
        period.clone_into(&mut series.period);
        Ok(series)
    }
}

#[async_trait]
impl FundamentalsSource for StaticMarketData {
    async fn fetch_fundamentals(&self, ticker: &Ticker) -> Result<Fundamentals, SourceError> {
        self.fundamentals
            .get(ticker.as_str())
            .cloned()
            .ok_or_else(|| SourceError::NotFound(ticker.to_string()))
    }
}

#[async_trait]
impl SymbolDirectory for StaticMarketData {
    async fn exists(&self, ticker: &Ticker) -> bool {
        self.tickers().any(|t| t == ticker.as_str())
    }
}

/// Daily bars ending today that move linearly by `change_pct` percent
pub fn trending_series(ticker: &str, period: &str, start: f64, change_pct: f64, days: usize) -> PriceSeries {
    let today = Utc::now().date_naive();
    let steps = days.saturating_sub(1).max(1) as f64;
    let points = (0..days)
        .map(|i| {
            let close = start * (1.0 + change_pct / 100.0 * i as f64 / steps);
            PricePoint {
                date: today - TimeDelta::days((days - 1 - i) as i64),
                open: close * 0.998,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume: 50_000_000,
            }
        })
        .collect();
    PriceSeries::new(ticker, period, points)
}

/// A completed bullish analysis
pub fn sample_result(ticker: &str) -> AnalysisResult {
    AnalysisResult {
        analysis_id: Uuid::new_v4(),
        ticker: ticker.to_string(),
        status: RunStatus::Completed,
        incomplete: false,
        summary: format!("{ticker} news flow is constructive."),
        overall_sentiment: Some(SentimentLabel::Bullish),
        overall_confidence: Some(0.8),
        sentiment: Some(SentimentReport {
            overall_sentiment: SentimentLabel::Bullish,
            overall_confidence: 0.8,
            bullish_count: 2,
            bearish_count: 0,
            neutral_count: 0,
            headline_analyses: Vec::new(),
            key_themes: vec![KeyTheme {
                theme: "Earnings strength".to_string(),
                direction: SentimentLabel::Bullish,
                headline_count: 2,
                summary: "Results beat expectations".to_string(),
            }],
            potential_impact: PotentialImpact::Positive,
            risks_identified: Vec::new(),
            information_gaps: Vec::new(),
            summary: String::new(),
        }),
        headlines: vec![Headline::new(format!("{ticker} beats estimates"))],
        price_data: None,
        reasoning_steps: vec!["Fetched 1 headlines".to_string()],
        tools_used: Vec::new(),
        iterations: 1,
        warnings: Vec::new(),
        generated_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trending_series() {
        let series = trending_series("AAPL", "1mo", 100.0, 10.0, 21);
        assert_eq!(series.len(), 21);
        assert!((series.change_pct().unwrap() - 10.0).abs() < 1e-9);
        assert!(series.points.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[tokio::test]
    async fn test_demo_sources() {
        let data = StaticMarketData::demo();
        let aapl = Ticker::parse("AAPL").unwrap();

        assert_eq!(data.fetch_headlines(&aapl, 7).await.unwrap().len(), 8);
        assert_eq!(data.fetch_price_history(&aapl, "3mo").await.unwrap().period, "3mo");
        assert!(data.exists(&aapl).await);

        let unknown = Ticker::parse("XXXX").unwrap();
        assert!(!data.exists(&unknown).await);
        assert!(matches!(
            data.fetch_fundamentals(&unknown).await,
            Err(SourceError::NotFound(_))
        ));
    }
}
