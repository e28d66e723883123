//! Scheduled sweep over every monitored thesis
//!
//! Theses are grouped by ticker so each ticker is analyzed once, however
//! many theses watch it. A ticker whose analysis fails is reported and
//! skipped; the sweep carries on with the rest.

use crate::{KillAlert, KillCriteriaMonitor, Result, Thesis, ThesisStore};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};
use verdict_core::AnalysisDigest;

/// Produces a fresh analysis for a ticker
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DigestSource: Send + Sync {
    async fn digest_for(&self, ticker: &str) -> Result<AnalysisDigest>;
}

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepReport {
    /// Tickers analyzed successfully, in sweep order
    pub tickers: Vec<String>,
    pub theses_checked: usize,
    pub alerts: Vec<KillAlert>,
    /// Ticker and error message for each failed analysis
    pub failures: Vec<(String, String)>,
}

impl KillCriteriaMonitor {
    /// Check every monitored thesis in the store against fresh analysis
    ///
    /// Tickers are visited in alphabetical order. Only a store failure aborts
    /// the sweep.
    #[instrument(skip_all)]
    pub async fn sweep(
        &self,
        store: &dyn ThesisStore,
        source: &dyn DigestSource,
    ) -> Result<SweepReport> {
        let theses = store.active_theses().await?;
        let by_ticker = group_by_ticker(theses);
        info!(tickers = by_ticker.len(), "Sweeping monitored theses");

        let mut report = SweepReport::default();
        for (ticker, theses) in by_ticker {
            let digest = match source.digest_for(&ticker).await {
                Ok(digest) => digest,
                Err(err) => {
                    warn!(ticker = %ticker, error = %err, "Analysis failed, skipping ticker");
                    report.failures.push((ticker, err.to_string()));
                    continue;
                }
            };

            for thesis in &theses {
                report.alerts.extend(self.check(thesis, &digest));
            }
            report.theses_checked += theses.len();
            report.tickers.push(ticker);
        }

        info!(
            checked = report.theses_checked,
            alerts = report.alerts.len(),
            failures = report.failures.len(),
            "Sweep finished"
        );
        Ok(report)
    }
}

fn group_by_ticker(theses: Vec<Thesis>) -> BTreeMap<String, Vec<Thesis>> {
    let mut grouped: BTreeMap<String, Vec<Thesis>> = BTreeMap::new();
    for thesis in theses.into_iter().filter(Thesis::is_monitored) {
        let ticker = thesis.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            continue;
        }
        grouped.entry(ticker).or_default().push(thesis);
    }
    grouped
}
