//! `verdict monitor <TICKER> --criterion ...`

use crate::Context;
use crate::commands::{analyze, debate};
use crate::output::alerts_table;
use anyhow::Result;
use clap::Args;
use tracing::info;
use verdict_monitor::{InMemoryThesisStore, KillCriteriaMonitor, Thesis};

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Ticker symbol, e.g. TSLA
    pub ticker: String,

    /// Kill criterion; repeat for several
    #[arg(short = 'c', long = "criterion", required = true)]
    pub criteria: Vec<String>,

    /// Match against a debate report instead of a loop analysis
    #[arg(long)]
    pub debate: bool,
}

pub async fn run(args: MonitorArgs, ctx: &Context) -> Result<()> {
    let monitor = KillCriteriaMonitor::new(ctx.config.monitor.clone())?;
    let digest = if args.debate {
        debate::debate(&args.ticker, ctx).await?.digest()
    } else {
        analyze::analyze(&args.ticker, ctx).await?.digest()
    };

    let thesis = args
        .criteria
        .into_iter()
        .fold(Thesis::new(&digest.ticker), Thesis::with_criterion);
    let store = InMemoryThesisStore::new();
    store.insert(thesis).await;

    let alerts = monitor.check_theses(&store, &digest).await?;
    info!(alerts = alerts.len(), "Monitor finished");
    if alerts.is_empty() {
        println!("No kill criteria met for {}", digest.ticker);
    } else {
        println!("{}", alerts_table(&alerts));
        for alert in &alerts {
            println!("- {}", alert.explanation);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::RunStatus;
    use verdict_utils::AppConfig;

    fn offline() -> Context {
        Context {
            config: AppConfig::default(),
            offline: true,
            quiet: true,
        }
    }

    #[tokio::test]
    async fn test_offline_analysis_feeds_the_monitor() {
        let ctx = offline();
        let result = analyze::analyze("TSLA", &ctx).await.unwrap();
        assert_eq!(result.status, RunStatus::Completed);

        let thesis = Thesis::new("TSLA")
            .with_criterion("CFO resigns")
            .with_criterion("Dividend cut");
        let alerts = KillCriteriaMonitor::default().check(&thesis, &result.digest());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].criterion, "CFO resigns");
    }

    #[tokio::test]
    async fn test_offline_debate_produces_a_verdict() {
        let ctx = offline();
        let report = debate::debate("AAPL", &ctx).await.unwrap();
        let verdict = &report.verdict;
        assert!((verdict.probabilities.total() - 1.0).abs() < 1e-6);
        assert!(verdict.degraded_sides.is_empty());
        assert!(!report.rebuttals.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ticker_fails_validation() {
        let err = analyze::analyze("XXXX", &offline()).await.unwrap_err();
        assert!(err.to_string().contains("XXXX"));
    }
}
