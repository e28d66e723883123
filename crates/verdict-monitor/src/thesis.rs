//! Recorded investment theses and read access to them

use crate::{MonitorError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThesisStatus {
    #[default]
    Active,
    Closed,
    Invalidated,
}

/// A position rationale with the conditions that would end it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thesis {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub ticker: String,
    #[serde(default)]
    pub status: ThesisStatus,
    #[serde(default)]
    pub kill_criteria: Vec<String>,
}

impl Thesis {
    /// Active thesis with a fresh id
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticker: ticker.into().to_uppercase(),
            status: ThesisStatus::Active,
            kill_criteria: Vec::new(),
        }
    }

    pub fn with_criterion(mut self, criterion: impl Into<String>) -> Self {
        self.kill_criteria.push(criterion.into());
        self
    }

    pub fn with_status(mut self, status: ThesisStatus) -> Self {
        self.status = status;
        self
    }

    /// Whether the monitor should look at this thesis
    pub fn is_monitored(&self) -> bool {
        self.status == ThesisStatus::Active
            && self.kill_criteria.iter().any(|c| !c.trim().is_empty())
    }
}

/// Read-only access to recorded theses
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ThesisStore: Send + Sync {
    /// Every thesis recorded for a ticker
    async fn theses_for(&self, ticker: &str) -> Result<Vec<Thesis>>;

    /// Monitored theses across all tickers
    async fn active_theses(&self) -> Result<Vec<Thesis>>;
}

/// Process-local store, keyed by upper-case ticker
#[derive(Debug, Default)]
pub struct InMemoryThesisStore {
    theses: RwLock<HashMap<String, Vec<Thesis>>>,
}

impl InMemoryThesisStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, thesis: Thesis) {
        let mut theses = self.theses.write().await;
        theses
            .entry(thesis.ticker.to_uppercase())
            .or_default()
            .push(thesis);
    }

    pub async fn len(&self) -> usize {
        self.theses.read().await.values().map(Vec::len).sum()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ThesisStore for InMemoryThesisStore {
    async fn theses_for(&self, ticker: &str) -> Result<Vec<Thesis>> {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(MonitorError::Store("ticker is empty".to_string()));
        }
        let theses = self.theses.read().await;
        Ok(theses.get(&ticker).cloned().unwrap_or_default())
    }

    async fn active_theses(&self) -> Result<Vec<Thesis>> {
        let theses = self.theses.read().await;
        Ok(theses
            .values()
            .flatten()
            .filter(|t| t.is_monitored())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_is_case_insensitive() {
        let store = InMemoryThesisStore::new();
        store.insert(Thesis::new("aapl").with_criterion("CEO resigns")).await;
        store.insert(Thesis::new("MSFT")).await;

        let theses = store.theses_for("AAPL").await.unwrap();
        assert_eq!(theses.len(), 1);
        assert_eq!(theses[0].kill_criteria, vec!["CEO resigns".to_string()]);
        assert!(store.theses_for("TSLA").await.unwrap().is_empty());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_active_theses_span_tickers() {
        let store = InMemoryThesisStore::new();
        store.insert(Thesis::new("AAPL").with_criterion("CEO resigns")).await;
        store.insert(Thesis::new("TSLA").with_criterion("Recall expands")).await;
        store
            .insert(
                Thesis::new("TSLA")
                    .with_criterion("Margin compression")
                    .with_status(ThesisStatus::Invalidated),
            )
            .await;
        store.insert(Thesis::new("MSFT")).await;

        let mut tickers: Vec<String> = store
            .active_theses()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.ticker)
            .collect();
        tickers.sort();
        assert_eq!(tickers, vec!["AAPL".to_string(), "TSLA".to_string()]);
    }

    #[test]
    fn test_thesis_id_is_optional_on_input() {
        let thesis: Thesis =
            serde_json::from_str(r#"{"ticker": "AAPL", "kill_criteria": ["CEO resigns"]}"#).unwrap();
        assert!(thesis.is_monitored());
        assert!(!thesis.id.is_nil());
    }

    #[tokio::test]
    async fn test_empty_ticker_is_an_error() {
        let store = InMemoryThesisStore::new();
        assert!(matches!(store.theses_for("  ").await, Err(MonitorError::Store(_))));
    }

    #[test]
    fn test_only_active_theses_with_criteria_are_monitored() {
        assert!(Thesis::new("AAPL").with_criterion("CEO resigns").is_monitored());
        assert!(!Thesis::new("AAPL").is_monitored());
        assert!(!Thesis::new("AAPL").with_criterion("   ").is_monitored());
        assert!(
            !Thesis::new("AAPL")
                .with_criterion("CEO resigns")
                .with_status(ThesisStatus::Closed)
                .is_monitored()
        );
    }
}
