//! The information set both agents draft from

use serde::{Deserialize, Serialize};
use verdict_core::{Fundamentals, Headline, PriceSeries, SentimentReport, Ticker};

/// Data gathered once per debate and handed to both sides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedData {
    pub ticker: Ticker,
    /// Empty for instruments without fundamentals (ETFs)
    pub fundamentals: Fundamentals,
    pub headlines: Vec<Headline>,
    pub price_data: Option<PriceSeries>,
    pub sentiment: Option<SentimentReport>,
}

impl SharedData {
    pub fn new(ticker: Ticker) -> Self {
        Self {
            ticker,
            fundamentals: Fundamentals::default(),
            headlines: Vec::new(),
            price_data: None,
            sentiment: None,
        }
    }

    pub fn with_fundamentals(mut self, fundamentals: Fundamentals) -> Self {
        self.fundamentals = fundamentals;
        self
    }

    pub fn with_headlines(mut self, headlines: Vec<Headline>) -> Self {
        self.headlines = headlines;
        self
    }

    pub fn with_price_data(mut self, series: PriceSeries) -> Self {
        self.price_data = Some(series);
        self
    }

    pub fn with_sentiment(mut self, report: SentimentReport) -> Self {
        self.sentiment = Some(report);
        self
    }

    /// Headline numbers of the price series
    pub fn price_stats(&self) -> Option<PriceStats> {
        let series = self.price_data.as_ref()?;
        Some(PriceStats {
            period: series.period.clone(),
            first_close: series.first_close()?,
            last_close: series.last_close()?,
            change_pct: series.change_pct()?,
            period_high: series.period_high()?,
            period_low: series.period_low()?,
        })
    }
}

/// Summary of a price series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub period: String,
    pub first_close: f64,
    pub last_close: f64,
    pub change_pct: f64,
    pub period_high: f64,
    pub period_low: f64,
}
