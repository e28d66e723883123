//! `verdict analyze <TICKER>`

use crate::Context;
use crate::backend::Backend;
use crate::output::{analysis_table, cancel_on_ctrl_c, spawn_event_printer};
use anyhow::Result;
use clap::Args;
use verdict_core::{AnalysisResult, ProgressEmitter};

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Ticker symbol, e.g. AAPL
    pub ticker: String,
}

pub async fn run(args: AnalyzeArgs, ctx: &Context) -> Result<()> {
    let result = analyze(&args.ticker, ctx).await?;
    println!("{}", analysis_table(&result));
    Ok(())
}

/// Run the loop while streaming its events
pub async fn analyze(ticker: &str, ctx: &Context) -> Result<AnalysisResult> {
    let backend = Backend::connect(&ctx.config, ctx.offline, ticker).await?;
    let engine = backend.analysis_engine(&ctx.config)?;

    let (emitter, stream) = ProgressEmitter::channel(ctx.config.event_buffer);
    let printer = spawn_event_printer(stream, ctx.quiet);
    let outcome = engine.run(ticker, &emitter, &cancel_on_ctrl_c()).await;
    drop(emitter);
    printer.await?;
    if !ctx.quiet {
        println!();
    }
    Ok(outcome?)
}
