//! `verdict sweep --theses <FILE>`

use crate::Context;
use crate::commands::analyze;
use crate::output::alerts_table;
use anyhow::{Context as _, Result};
use async_trait::async_trait;
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::info;
use verdict_core::AnalysisDigest;
use verdict_monitor::{
    DigestSource, InMemoryThesisStore, KillCriteriaMonitor, MonitorError, SweepReport, Thesis,
};

#[derive(Args, Debug)]
pub struct SweepArgs {
    /// JSON array of theses: `[{"ticker": "TSLA", "kill_criteria": ["CFO resigns"]}]`
    #[arg(long)]
    pub theses: PathBuf,
}

/// Fresh digests from the reasoning loop
struct LoopDigests<'a> {
    ctx: &'a Context,
}

#[async_trait]
impl DigestSource for LoopDigests<'_> {
    async fn digest_for(&self, ticker: &str) -> verdict_monitor::Result<AnalysisDigest> {
        analyze::analyze(ticker, self.ctx)
            .await
            .map(|result| result.digest())
            .map_err(|err| MonitorError::Analysis {
                ticker: ticker.to_string(),
                message: format!("{err:#}"),
            })
    }
}

pub async fn run(args: SweepArgs, ctx: &Context) -> Result<()> {
    let store = load_theses(&args.theses).await?;
    let report = sweep(&store, ctx).await?;

    println!(
        "Checked {} theses across {} tickers",
        report.theses_checked,
        report.tickers.len()
    );
    if report.alerts.is_empty() {
        println!("No kill criteria met");
    } else {
        println!("{}", alerts_table(&report.alerts));
        for alert in &report.alerts {
            println!("- {}: {}", alert.ticker, alert.explanation);
        }
    }
    for (ticker, message) in &report.failures {
        eprintln!("{ticker}: {message}");
    }
    Ok(())
}

/// Run one analysis per watched ticker and check every thesis against it
pub async fn sweep(store: &InMemoryThesisStore, ctx: &Context) -> Result<SweepReport> {
    let monitor = KillCriteriaMonitor::new(ctx.config.monitor.clone())?;
    let report = monitor.sweep(store, &LoopDigests { ctx }).await?;
    info!(
        alerts = report.alerts.len(),
        failures = report.failures.len(),
        "Sweep complete"
    );
    Ok(report)
}

async fn load_theses(path: &Path) -> Result<InMemoryThesisStore> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let theses: Vec<Thesis> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse theses in {}", path.display()))?;

    let store = InMemoryThesisStore::new();
    for thesis in theses {
        store.insert(thesis).await;
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_utils::AppConfig;

    fn offline() -> Context {
        Context {
            config: AppConfig::default(),
            offline: true,
            quiet: true,
        }
    }

    #[tokio::test]
    async fn test_offline_sweep_checks_each_ticker_once() {
        let store = InMemoryThesisStore::new();
        store.insert(Thesis::new("TSLA").with_criterion("CFO resigns")).await;
        store.insert(Thesis::new("TSLA").with_criterion("Dividend cut")).await;
        store.insert(Thesis::new("XXXX").with_criterion("CEO resigns")).await;

        let report = sweep(&store, &offline()).await.unwrap();
        assert_eq!(report.tickers, vec!["TSLA".to_string()]);
        assert_eq!(report.theses_checked, 2);
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].criterion, "CFO resigns");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "XXXX");
    }

    #[tokio::test]
    async fn test_theses_file_is_loaded() {
        let path = std::env::temp_dir().join(format!("verdict-{}-theses.json", std::process::id()));
        tokio::fs::write(
            &path,
            r#"[{"ticker": "tsla", "kill_criteria": ["CFO resigns"]}, {"ticker": "AAPL"}]"#,
        )
        .await
        .unwrap();

        let store = load_theses(&path).await.unwrap();
        assert_eq!(store.len().await, 2);
        tokio::fs::remove_file(&path).await.unwrap();
    }
}
