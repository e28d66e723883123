//! Prompt templates and answer schemas for the debate agents

use crate::{Case, DebateError, EmphasisProfile, Result, Role, SharedData};
use serde_json::{Value, json};
use verdict_llm::PromptTemplate;
use verdict_llm::tools::schema;

const BULL_SYSTEM: &str = "You are the bull analyst in an investment debate. Build the strongest \
honest case for owning the stock: growth drivers, catalysts and upside. Every claim must cite \
a data point you were given. You must concede at least one weakness you cannot refute. \
Answer with a single JSON document.";

const BEAR_SYSTEM: &str = "You are the bear analyst in an investment debate. Build the strongest \
honest case against owning the stock: leverage, margin pressure, valuation and downside risks. \
Every claim must cite a data point you were given. You must concede at least one weakness you \
cannot refute. Answer with a single JSON document.";

const DRAFT_TEMPLATE: &str = "Draft the {{ role }} case for {{ ticker }}\
{% if company %} ({{ company }}{% if sector %}, {{ sector }}{% endif %}){% endif %}.

## Fundamentals
{% for m in metrics -%}
- {{ m.name }}: {{ m.value | fixed }}
{% else -%}
- none available
{% endfor %}
## Price action
{% if price -%}
{{ price.period }}: {{ price.first_close | fixed }} -> {{ price.last_close | fixed }} \
({{ price.change_pct | fixed }}%), range {{ price.period_low | fixed }} - {{ price.period_high | fixed }}
{%- else -%}
No price history available
{%- endif %}

## Headlines
{% for h in headlines -%}
{{ loop.index }}. {{ h }}
{% else -%}
No recent headlines
{% endfor %}
{%- if sentiment %}
## News sentiment
{{ sentiment.label }} (confidence {{ sentiment.confidence | pct }}): {{ sentiment.summary }}
{% for t in themes -%}
- {{ t.theme }} [{{ t.direction }}]{% if t.summary %}: {{ t.summary }}{% endif %}
{% endfor %}
{%- for r in risks -%}
- risk: {{ r }}
{% endfor %}
{%- endif %}
Return thesis, key_claims (statement, evidence, data_source, confidence), \
{% if role == \"Bull\" %}catalysts (description, timeframe, probability, impact){% else %}\
risks (description, category, severity, probability, timeframe){% endif %}, weaknesses and confidence. \
Timeframes are near-term, medium-term or long-term; impact and severity are low, medium, high \
or critical. All confidences and probabilities are between 0 and 1.
{%- if feedback %}

Your previous answer was rejected: {{ feedback }}. Fix it and answer again.
{%- endif %}";

const REBUTTAL_TEMPLATE: &str = "You argued the {{ role }} case for {{ ticker }}: {{ own_thesis }}

The {{ opponent }} side argues: {{ opposing_thesis }}
Their claims:
{% for c in claims -%}
- \"{{ c.statement }}\" (confidence {{ c.confidence | fixed }}){% if c.evidence %}; evidence: {{ c.evidence }}{% endif %}
{% endfor %}
Rebut the claims you can genuinely counter. Quote the targeted claim verbatim in target_claim, \
give a counter_argument, any counter_evidence from the data, and a strength between 0 and 1. \
Your strength may not exceed {{ ceiling | fixed }}, the confidence of your weakest claim.";

pub(crate) fn system_prompt(role: Role) -> &'static str {
    match role {
        Role::Bull => BULL_SYSTEM,
        Role::Bear => BEAR_SYSTEM,
    }
}

/// Render the drafting prompt with data ordered by the role's profile
pub(crate) fn draft_prompt(
    role: Role,
    profile: &EmphasisProfile,
    shared: &SharedData,
    feedback: Option<&str>,
) -> Result<String> {
    let metrics: Vec<Value> = profile
        .prioritize(&shared.fundamentals)
        .into_iter()
        .map(|(name, value)| json!({ "name": name, "value": value }))
        .collect();
    let headlines: Vec<String> = profile
        .rank_headlines(&shared.headlines)
        .into_iter()
        .map(|h| h.title)
        .collect();
    let (sentiment, themes, risks) = match &shared.sentiment {
        Some(report) => (
            Some(json!({
                "label": report.overall_sentiment.as_str(),
                "confidence": report.overall_confidence,
                "summary": report.summary,
            })),
            profile.rank_themes(&report.key_themes),
            report.risks_identified.clone(),
        ),
        None => (None, Vec::new(), Vec::new()),
    };

    render(
        "debate.draft",
        DRAFT_TEMPLATE,
        &json!({
            "role": role.label(),
            "ticker": shared.ticker.as_str(),
            "company": shared.fundamentals.company_name,
            "sector": shared.fundamentals.sector,
            "metrics": metrics,
            "price": shared.price_stats(),
            "headlines": headlines,
            "sentiment": sentiment,
            "themes": themes,
            "risks": risks,
            "feedback": feedback,
        }),
    )
}

pub(crate) fn rebuttal_prompt(opposing: &Case, own: &Case) -> Result<String> {
    render(
        "debate.rebuttal",
        REBUTTAL_TEMPLATE,
        &json!({
            "role": own.role.label(),
            "opponent": opposing.role.label(),
            "ticker": own.ticker,
            "own_thesis": own.thesis,
            "opposing_thesis": opposing.thesis,
            "claims": opposing.claims,
            "ceiling": own.min_claim_confidence(),
        }),
    )
}

fn render(name: &str, source: &str, context: &Value) -> Result<String> {
    PromptTemplate::new(name, source)
        .and_then(|template| template.render(context))
        .map_err(|e| DebateError::Prompt(e.to_string()))
}

/// JSON schema of a case answer
pub(crate) fn case_schema(role: Role) -> Value {
    let claim = schema::object(
        json!({
            "statement": schema::string("A specific, checkable assertion"),
            "evidence": schema::string("The data point it rests on"),
            "data_source": schema::string_enum("Where the evidence comes from", &["fundamentals", "headlines", "price", "sentiment"]),
            "confidence": schema::number("Confidence between 0 and 1"),
        }),
        vec!["statement", "confidence"],
    );
    let timeframe = || schema::string_enum("When", &["near-term", "medium-term", "long-term"]);

    let (outlook_key, outlook) = match role {
        Role::Bull => (
            "catalysts",
            schema::object(
                json!({
                    "description": schema::string("What could drive the stock up"),
                    "timeframe": timeframe(),
                    "probability": schema::number("Probability between 0 and 1"),
                    "impact": schema::string_enum("Impact", &["low", "medium", "high"]),
                }),
                vec!["description", "probability"],
            ),
        ),
        Role::Bear => (
            "risks",
            schema::object(
                json!({
                    "description": schema::string("What could drive the stock down"),
                    "category": schema::string("e.g. financial, competitive, regulatory"),
                    "severity": schema::string_enum("Severity", &["low", "medium", "high", "critical"]),
                    "probability": schema::number("Probability between 0 and 1"),
                    "timeframe": timeframe(),
                }),
                vec!["description", "probability"],
            ),
        ),
    };

    let mut properties = json!({
        "thesis": schema::string("One paragraph"),
        "key_claims": schema::array("Claims", claim),
        "weaknesses": schema::array("Points you concede", schema::string("Weakness")),
        "confidence": schema::number("Overall confidence between 0 and 1"),
    });
    properties[outlook_key] = schema::array("Outlook items", outlook);

    schema::object(
        properties,
        vec!["thesis", "key_claims", outlook_key, "weaknesses", "confidence"],
    )
}

pub(crate) fn rebuttal_schema() -> Value {
    schema::object(
        json!({
            "rebuttals": schema::array("Rebuttals", schema::object(
                json!({
                    "target_claim": schema::string("The opposing claim, verbatim"),
                    "counter_argument": schema::string("Why it does not hold"),
                    "counter_evidence": schema::string("Data that contradicts it"),
                    "strength": schema::number("Strength between 0 and 1"),
                }),
                vec!["target_claim", "counter_argument", "strength"],
            )),
        }),
        vec!["rebuttals"],
    )
}
