//! Scripted model for `--offline` runs
//!
//! Replies are derived from the fixture data for the requested ticker so
//! that the sentiment call, both drafts and both rebuttal rounds agree
//! with what the tools return.

use serde_json::{Value, json};
use verdict_core::{Fundamentals, Headline, SentimentLabel, Ticker};
use verdict_llm::{ScriptedProvider, ScriptedReply};
use verdict_tools::{FundamentalsSource, HeadlineSource, PriceSource, StaticMarketData};

const RISK_WORDS: &[&str] = &[
    "recall", "probe", "miss", "cuts", "steps down", "lawsuit", "downgrade", "layoff",
];

/// Month-over-month move that counts as a trend
const TREND_PCT: f64 = 2.0;

pub async fn scripted_model(raw_ticker: &str, data: &StaticMarketData) -> ScriptedProvider {
    let Ok(ticker) = Ticker::parse(raw_ticker) else {
        return ScriptedProvider::new();
    };
    let headlines = data.fetch_headlines(&ticker, 7).await.unwrap_or_default();
    let change_pct = data
        .fetch_price_history(&ticker, "1mo")
        .await
        .ok()
        .and_then(|series| series.change_pct())
        .unwrap_or(0.0);
    let fundamentals = data.fetch_fundamentals(&ticker).await.unwrap_or_default();

    let bull_claims = bull_claims(&fundamentals, change_pct);
    let bear_claims = bear_claims(&fundamentals, change_pct);

    ScriptedProvider::new()
        .always(
            "sentiment",
            ScriptedReply::Json(sentiment(&headlines, change_pct)),
        )
        .always(
            "debate.bull.draft",
            ScriptedReply::Json(json!({
                "thesis": format!("{ticker} has more upside than the market is pricing in."),
                "key_claims": bull_claims,
                "catalysts": [{
                    "description": "Next earnings report confirms the trend",
                    "timeframe": "near-term",
                    "probability": 0.6,
                    "impact": "medium"
                }],
                "weaknesses": ["Valuation leaves little room for disappointment"],
                "confidence": 0.65
            })),
        )
        .always(
            "debate.bear.draft",
            ScriptedReply::Json(json!({
                "thesis": format!("{ticker} carries risks the price does not reflect."),
                "key_claims": bear_claims,
                "risks": [{
                    "description": "Execution slips in a tougher demand environment",
                    "category": "operational",
                    "severity": "medium",
                    "probability": 0.4,
                    "timeframe": "medium-term"
                }],
                "weaknesses": ["The balance sheet can absorb a weak quarter"],
                "confidence": 0.6
            })),
        )
        .always(
            "debate.bull.rebuttal",
            ScriptedReply::Json(rebuttal(
                &bear_claims,
                "The concern is already reflected in consensus estimates",
                0.5,
            )),
        )
        .always(
            "debate.bear.rebuttal",
            ScriptedReply::Json(rebuttal(
                &bull_claims,
                "Past momentum says little about the next two quarters",
                0.55,
            )),
        )
}

fn sentiment(headlines: &[Headline], change_pct: f64) -> Value {
    if headlines.is_empty() {
        return json!({
            "overall_sentiment": "Insufficient Data",
            "overall_confidence": 0.0,
            "summary": "No headlines to analyze."
        });
    }
    let label = if change_pct > TREND_PCT {
        SentimentLabel::Bullish
    } else if change_pct < -TREND_PCT {
        SentimentLabel::Bearish
    } else {
        SentimentLabel::Neutral
    };
    let count = |l: SentimentLabel| if l == label { headlines.len() } else { 0 };
    let risks: Vec<&str> = headlines
        .iter()
        .map(|h| h.title.as_str())
        .filter(|title| {
            let lower = title.to_lowercase();
            RISK_WORDS.iter().any(|w| lower.contains(w))
        })
        .collect();
    let themes: Vec<Value> = headlines
        .iter()
        .take(2)
        .map(|h| json!({"theme": h.title, "direction": label, "headline_count": 1}))
        .collect();

    let impact = match label {
        SentimentLabel::Bullish => "Positive",
        SentimentLabel::Bearish => "Negative",
        _ => "Uncertain",
    };

    json!({
        "overall_sentiment": label,
        "overall_confidence": 0.7,
        "bullish_count": count(SentimentLabel::Bullish),
        "bearish_count": count(SentimentLabel::Bearish),
        "neutral_count": count(SentimentLabel::Neutral),
        "key_themes": themes,
        "potential_impact": impact,
        "risks_identified": risks,
        "summary": format!("{} headlines read as {label}; shares moved {change_pct:+.1}% over the month.", headlines.len()),
    })
}

fn claim(statement: String, source: &str, confidence: f64) -> Value {
    json!({"statement": statement, "data_source": source, "confidence": confidence})
}

fn bull_claims(fundamentals: &Fundamentals, change_pct: f64) -> Vec<Value> {
    let mut claims = Vec::new();
    if let Some(growth) = fundamentals.metric("revenue_growth") {
        claims.push(claim(
            format!("Revenue growth of {:.1}%", growth * 100.0),
            "fundamentals",
            0.7,
        ));
    }
    if let Some(target) = fundamentals.metric("target_mean") {
        claims.push(claim(
            format!("Analysts' mean price target is {target:.0}"),
            "fundamentals",
            0.6,
        ));
    }
    claims.push(claim(
        format!("Shares moved {change_pct:+.1}% over the past month"),
        "price",
        0.55,
    ));
    claims
}

fn bear_claims(fundamentals: &Fundamentals, change_pct: f64) -> Vec<Value> {
    let mut claims = Vec::new();
    if let Some(de) = fundamentals.metric("debt_to_equity") {
        claims.push(claim(format!("Debt to equity of {de:.2}"), "fundamentals", 0.6));
    }
    if let Some(pe) = fundamentals.metric("pe_ratio") {
        claims.push(claim(format!("P/E ratio of {pe:.1} is demanding"), "fundamentals", 0.6));
    }
    if claims.is_empty() {
        claims.push(claim(
            format!("Shares moved {change_pct:+.1}% over the past month without a fundamental anchor"),
            "price",
            0.5,
        ));
    }
    claims
}

fn rebuttal(targets: &[Value], argument: &str, strength: f64) -> Value {
    let rebuttals: Vec<Value> = targets
        .iter()
        .take(1)
        .map(|target| {
            json!({
                "target_claim": target["statement"],
                "counter_argument": argument,
                "strength": strength
            })
        })
        .collect();
    json!({ "rebuttals": rebuttals })
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::SentimentReport;
    use verdict_llm::{CompletionRequest, Message, ModelProvider};

    async fn reply(provider: &ScriptedProvider, purpose: &str) -> String {
        let request = CompletionRequest::builder("offline")
            .add_message(Message::user("go"))
            .purpose(purpose)
            .build();
        let response = provider.complete(request).await.unwrap();
        response.message.text().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_sentiment_follows_price_trend() {
        let data = StaticMarketData::demo();
        let provider = scripted_model("TSLA", &data).await;
        let report: SentimentReport =
            serde_json::from_str(&reply(&provider, "sentiment").await).unwrap();
        assert_eq!(report.overall_sentiment, SentimentLabel::Bearish);
        assert_eq!(report.bearish_count, 6);
        assert!(
            report
                .risks_identified
                .contains(&"Tesla CFO steps down after four years".to_string())
        );
    }

    #[tokio::test]
    async fn test_rebuttals_target_opposing_claims() {
        let data = StaticMarketData::demo();
        let provider = scripted_model("AAPL", &data).await;
        let bull: Value = serde_json::from_str(&reply(&provider, "debate.bull.draft").await).unwrap();
        let bear_rebuttal: Value =
            serde_json::from_str(&reply(&provider, "debate.bear.rebuttal").await).unwrap();
        assert_eq!(
            bear_rebuttal["rebuttals"][0]["target_claim"],
            bull["key_claims"][0]["statement"]
        );
        assert_eq!(bull["key_claims"][0]["statement"], "Revenue growth of 6.1%");
    }

    #[tokio::test]
    async fn test_invalid_ticker_gets_empty_script() {
        let data = StaticMarketData::demo();
        let provider = scripted_model("12", &data).await;
        let request = CompletionRequest::builder("offline").purpose("sentiment").build();
        assert!(provider.complete(request).await.is_err());
    }
}
