//! `verdict debate <TICKER>`

use crate::Context;
use crate::backend::Backend;
use crate::output::{cancel_on_ctrl_c, grades_table, spawn_event_printer, verdict_table};
use anyhow::Result;
use clap::Args;
use verdict_core::ProgressEmitter;
use verdict_debate::DebateReport;

#[derive(Args, Debug)]
pub struct DebateArgs {
    /// Ticker symbol, e.g. AAPL
    pub ticker: String,

    /// Also print the graded claims
    #[arg(long)]
    pub grades: bool,
}

pub async fn run(args: DebateArgs, ctx: &Context) -> Result<()> {
    let report = debate(&args.ticker, ctx).await?;
    println!("{}", verdict_table(&report));
    if args.grades {
        println!("{}", grades_table(&report));
    }
    Ok(())
}

/// Run a debate while streaming its events
pub async fn debate(ticker: &str, ctx: &Context) -> Result<DebateReport> {
    let backend = Backend::connect(&ctx.config, ctx.offline, ticker).await?;
    let orchestrator = backend.debate_orchestrator(&ctx.config)?;

    let (emitter, stream) = ProgressEmitter::channel(ctx.config.event_buffer);
    let printer = spawn_event_printer(stream, ctx.quiet);
    let outcome = orchestrator.run(ticker, &emitter, &cancel_on_ctrl_c()).await;
    drop(emitter);
    printer.await?;
    if !ctx.quiet {
        println!();
    }
    Ok(outcome?)
}
