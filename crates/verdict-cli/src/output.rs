//! Terminal output: event frames and result tables

use comfy_table::{Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use verdict_core::{AnalysisResult, EventStream};
use verdict_debate::{DebateReport, Role};
use verdict_monitor::KillAlert;

/// Print every event as an SSE frame until the run closes the stream
pub fn spawn_event_printer(mut stream: EventStream, quiet: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = stream.recv().await {
            if quiet {
                continue;
            }
            match event.to_sse_frame() {
                Ok(frame) => print!("{frame}"),
                Err(err) => warn!(error = %err, "Could not encode progress event"),
            }
        }
    })
}

/// Token cancelled on Ctrl-C
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, cancelling run");
            child.cancel();
        }
    });
    token
}

fn table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header.iter().map(|h| Cell::new(h).fg(Color::Cyan)));
    table
}

fn pct(value: f64) -> String {
    format!("{:.0}%", value * 100.0)
}

pub fn analysis_table(result: &AnalysisResult) -> Table {
    let mut table = table(&["Field", "Value"]);
    let sentiment = result
        .overall_sentiment
        .map_or_else(|| "n/a".to_string(), |s| s.to_string());
    let confidence = result.overall_confidence.map_or_else(|| "n/a".to_string(), pct);
    let tools: Vec<String> = result
        .tools_used
        .iter()
        .map(|inv| {
            let mark = if inv.succeeded() { "ok" } else { "failed" };
            format!("{} ({mark})", inv.tool)
        })
        .collect();

    let status = Cell::new(result.status).fg(if result.incomplete {
        Color::Yellow
    } else {
        Color::Green
    });
    table.add_row(vec![Cell::new("Ticker"), Cell::new(&result.ticker)]);
    table.add_row(vec![Cell::new("Status"), status]);
    table.add_row(vec!["Sentiment".to_string(), sentiment]);
    table.add_row(vec!["Confidence".to_string(), confidence]);
    table.add_row(vec!["Iterations".to_string(), result.iterations.to_string()]);
    table.add_row(vec!["Tools".to_string(), tools.join(", ")]);
    table.add_row(vec!["Summary", result.summary.as_str()]);
    for warning in &result.warnings {
        table.add_row(vec![Cell::new("Warning").fg(Color::Yellow), Cell::new(warning)]);
    }
    table
}

pub fn verdict_table(report: &DebateReport) -> Table {
    let verdict = &report.verdict;
    let mut table = table(&["Field", "Value"]);
    table.add_row(vec![
        Cell::new("Recommendation"),
        Cell::new(verdict.recommendation).fg(Color::Green),
    ]);
    table.add_row(vec!["Conviction".to_string(), pct(verdict.conviction)]);
    table.add_row(vec![
        "Scenarios (bull / base / bear)".to_string(),
        format!(
            "{} / {} / {}",
            pct(verdict.probabilities.bull),
            pct(verdict.probabilities.base),
            pct(verdict.probabilities.bear)
        ),
    ]);
    table.add_row(vec![
        "Argument strength (bull / bear)".to_string(),
        format!(
            "{:.2} / {:.2}",
            verdict.argument_strength.bull, verdict.argument_strength.bear
        ),
    ]);
    table.add_row(vec!["Bull case", verdict.bull_summary.as_str()]);
    table.add_row(vec!["Bear case", verdict.bear_summary.as_str()]);
    for factor in &verdict.decisive_factors {
        table.add_row(vec!["Decisive factor", factor.as_str()]);
    }
    for question in &verdict.unresolved_questions {
        table.add_row(vec!["Unresolved", question.as_str()]);
    }
    table.add_row(vec!["Reasoning", verdict.synthesis_reasoning.as_str()]);
    for warning in &report.warnings {
        table.add_row(vec![Cell::new("Warning").fg(Color::Yellow), Cell::new(warning)]);
    }
    table
}

pub fn grades_table(report: &DebateReport) -> Table {
    let mut table = table(&["Claim", "Side", "Statement", "Support", "Rebuttal", "Credibility"]);
    for grade in &report.verdict.evidence_grades {
        let side = match grade.source_agent {
            Role::Bull => Cell::new(grade.source_agent).fg(Color::Green),
            Role::Bear => Cell::new(grade.source_agent).fg(Color::Red),
        };
        table.add_row(vec![
            Cell::new(&grade.claim_id),
            side,
            Cell::new(&grade.claim),
            Cell::new(format!("{:.2}", grade.data_support_score)),
            Cell::new(format!("{:.2}", grade.rebuttal_strength)),
            Cell::new(format!("{:.2}", grade.final_credibility)),
        ]);
    }
    table
}

pub fn alerts_table(alerts: &[KillAlert]) -> Table {
    let mut table = table(&["Ticker", "Criterion", "Triggering signal", "Confidence", "Status"]);
    for alert in alerts {
        table.add_row(vec![
            Cell::new(&alert.ticker),
            Cell::new(&alert.criterion).fg(Color::Red),
            Cell::new(&alert.triggering_signal),
            Cell::new(pct(alert.match_confidence)),
            Cell::new(alert.status),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_monitor::{AlertStatus, Thesis};

    fn alert() -> KillAlert {
        KillAlert {
            thesis_id: Thesis::new("TSLA").id,
            ticker: "TSLA".to_string(),
            criterion: "CFO resigns".to_string(),
            triggering_signal: "Tesla CFO steps down after four years".to_string(),
            match_confidence: 1.0,
            status: AlertStatus::Pending,
            explanation: String::new(),
        }
    }

    #[test]
    fn test_alerts_table_lists_each_alert() {
        let rendered = alerts_table(&[alert()]).to_string();
        assert!(rendered.contains("TSLA"));
        assert!(rendered.contains("CFO resigns"));
        assert!(rendered.contains("100%"));
        assert!(rendered.contains("pending"));
    }

    #[test]
    fn test_analysis_table_shows_status_and_tools() {
        let result = verdict_tools::fixtures::sample_result("AAPL");
        let rendered = analysis_table(&result).to_string();
        assert!(rendered.contains("AAPL"));
        assert!(rendered.contains("completed"));
        assert!(rendered.contains("Bullish"));
    }
}
