//! TTL cache of finished analyses keyed by ticker

use crate::sources::{AnalysisStore, SourceError};
use async_trait::async_trait;
use cached::{Cached, TimedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use verdict_core::{AnalysisResult, Ticker};

/// In-process analysis store; entries expire after the configured TTL
#[derive(Clone)]
pub struct CachedAnalysisStore {
    cache: Arc<RwLock<TimedCache<String, AnalysisResult>>>,
}

impl CachedAnalysisStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    pub async fn get(&self, ticker: &str) -> Option<AnalysisResult> {
        let mut cache = self.cache.write().await;
        cache.cache_get(&ticker.to_string()).cloned()
    }

    pub async fn insert(&self, ticker: &str, result: AnalysisResult) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(ticker.to_string(), result);
    }

    pub async fn invalidate(&self, ticker: &str) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_remove(&ticker.to_string());
    }

    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for CachedAnalysisStore {
    /// One-hour TTL
    fn default() -> Self {
        Self::new(Duration::from_secs(3600))
    }
}

#[async_trait]
impl AnalysisStore for CachedAnalysisStore {
    async fn save(&self, ticker: &Ticker, result: &AnalysisResult) -> Result<(), SourceError> {
        self.insert(ticker.as_str(), result.clone()).await;
        Ok(())
    }

    async fn load(&self, ticker: &Ticker) -> Result<Option<AnalysisResult>, SourceError> {
        let hit = self.get(ticker.as_str()).await;
        debug!(ticker = %ticker, hit = hit.is_some(), "Analysis cache lookup");
        Ok(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_result;

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = CachedAnalysisStore::new(Duration::from_secs(60));
        store.insert("AAPL", sample_result("AAPL")).await;

        assert_eq!(store.get("AAPL").await.unwrap().ticker, "AAPL");
        assert!(store.get("MSFT").await.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let store = CachedAnalysisStore::new(Duration::from_secs(60));
        store.insert("AAPL", sample_result("AAPL")).await;
        store.insert("MSFT", sample_result("MSFT")).await;

        store.invalidate("AAPL").await;
        assert!(store.get("AAPL").await.is_none());

        store.clear().await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_entries_expire() {
        let store = CachedAnalysisStore::new(Duration::from_secs(1));
        store.insert("AAPL", sample_result("AAPL")).await;
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(store.get("AAPL").await.is_none());
    }

    #[tokio::test]
    async fn test_store_trait_round_trip() {
        let store = CachedAnalysisStore::default();
        let ticker = Ticker::parse("NVDA").unwrap();
        let result = sample_result("NVDA");

        store.save(&ticker, &result).await.unwrap();
        let loaded = store.load(&ticker).await.unwrap().unwrap();
        assert_eq!(loaded.analysis_id, result.analysis_id);
    }
}
