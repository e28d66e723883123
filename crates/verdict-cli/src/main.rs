//! Command-line interface for verdict
//!
//! # Usage
//!
//! ```bash
//! # Reasoning-action analysis against a live OpenAI-compatible model
//! export OPENAI_API_BASE="http://localhost:1234/v1"
//! export OPENAI_MODEL="your-model-name"
//! verdict analyze AAPL
//!
//! # Bull/bear debate with the scripted model
//! verdict --offline debate AAPL
//!
//! # Check kill criteria against a fresh analysis
//! verdict --offline monitor TSLA --criterion "CFO resigns" --criterion "Recall expands"
//!
//! # Check every recorded thesis, one analysis per ticker
//! verdict --offline sweep --theses theses.json
//! ```
//!
//! Progress events go to stdout as server-sent-event frames, followed by
//! the result table. Logs go to stderr.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use verdict_utils::{AppConfig, LogFormat, init_tracing};

mod backend;
mod commands;
mod offline;
mod output;

use commands::{analyze, debate, monitor, sweep};

/// Autonomous market research: reasoning loop, bull/bear debate and kill-criteria alerts
#[derive(Parser, Debug)]
#[command(name = "verdict", version, about, long_about = None)]
struct Cli {
    /// Use a scripted model instead of a live one
    #[arg(long, global = true)]
    offline: bool,

    /// JSON config file; environment variables override it
    #[arg(long, global = true, env = "VERDICT_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format (pretty or json)
    #[arg(long, global = true, default_value = "pretty")]
    log_format: LogFormat,

    /// Do not print progress frames
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the reasoning-action loop for a ticker
    Analyze(analyze::AnalyzeArgs),

    /// Run a bull/bear debate and print the verdict
    Debate(debate::DebateArgs),

    /// Analyze a ticker, then check kill criteria against the result
    Monitor(monitor::MonitorArgs),

    /// Check the kill criteria of every thesis in a file
    Sweep(sweep::SweepArgs),
}

/// Settings shared by every subcommand
#[derive(Debug, Clone)]
pub struct Context {
    pub config: AppConfig,
    pub offline: bool,
    pub quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    info!(offline = cli.offline, model = %config.model.model, "Starting verdict");

    let ctx = Context {
        config,
        offline: cli.offline,
        quiet: cli.quiet,
    };
    match cli.command {
        Command::Analyze(args) => analyze::run(args, &ctx).await,
        Command::Debate(args) => debate::run(args, &ctx).await,
        Command::Monitor(args) => monitor::run(args, &ctx).await,
        Command::Sweep(args) => sweep::run(args, &ctx).await,
    }
}
