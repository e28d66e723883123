//! Rebuttals and their targeting rules

use crate::evidence::content_words;
use crate::{Case, Role};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

/// A counter-argument against one opposing claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rebuttal {
    pub author: Role,
    /// Id of the targeted claim in the opposing case
    pub target_claim_id: String,
    /// The targeted claim verbatim
    pub target_statement: String,
    pub counter_argument: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub counter_evidence: Option<String>,
    /// In [0, 1], never above the author's weakest claim confidence
    pub strength: f64,
}

impl Rebuttal {
    pub fn has_counter_evidence(&self) -> bool {
        self.counter_evidence
            .as_deref()
            .is_some_and(|e| !e.trim().is_empty())
    }
}

/// Raw model answer for one rebuttal
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RebuttalDraft {
    #[serde(alias = "target")]
    pub target_claim: String,
    #[serde(default)]
    pub counter_argument: String,
    #[serde(default)]
    pub counter_evidence: Option<String>,
    #[serde(default)]
    pub strength: f64,
}

/// Accept either a bare array or `{"rebuttals": [...]}`
pub(crate) fn parse_drafts(value: Value) -> Vec<RebuttalDraft> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("rebuttals") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

/// Resolve drafts against the opposing case and bound their strength
///
/// A draft targets a claim by exact statement, or failing that by the
/// closest word overlap; drafts that overlap no claim are dropped.
/// Strength is clamped to the author's weakest claim confidence.
pub(crate) fn resolve(drafts: Vec<RebuttalDraft>, opposing: &Case, own: &Case) -> Vec<Rebuttal> {
    let ceiling = own.min_claim_confidence().clamp(0.0, 1.0);
    drafts
        .into_iter()
        .filter_map(|draft| {
            let Some(claim) = target_claim(&draft.target_claim, opposing) else {
                debug!(target = %draft.target_claim, "Rebuttal matches no opposing claim, dropped");
                return None;
            };
            let strength = if draft.strength.is_finite() {
                draft.strength.clamp(0.0, 1.0).min(ceiling)
            } else {
                0.0
            };
            Some(Rebuttal {
                author: own.role,
                target_claim_id: claim.id.clone(),
                target_statement: claim.statement.clone(),
                counter_argument: draft.counter_argument.trim().to_string(),
                counter_evidence: draft
                    .counter_evidence
                    .filter(|e| !e.trim().is_empty()),
                strength,
            })
        })
        .collect()
}

fn target_claim<'a>(target: &str, opposing: &'a Case) -> Option<&'a crate::Claim> {
    let wanted = target.trim();
    if let Some(exact) = opposing
        .claims
        .iter()
        .find(|c| c.statement.trim().eq_ignore_ascii_case(wanted))
    {
        return Some(exact);
    }

    let wanted_words: BTreeSet<String> = content_words(wanted).collect();
    opposing
        .claims
        .iter()
        .map(|c| (similarity(&wanted_words, &c.statement), c))
        .filter(|(score, _)| *score > 0.0)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, c)| c)
}

/// Jaccard overlap of content words
fn similarity(wanted: &BTreeSet<String>, statement: &str) -> f64 {
    let words: BTreeSet<String> = content_words(statement).collect();
    let union = wanted.union(&words).count();
    if union == 0 {
        return 0.0;
    }
    wanted.intersection(&words).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Claim;
    use serde_json::json;

    fn case(role: Role, claims: &[(&str, f64)]) -> Case {
        let mut case = Case::degraded("AAPL", role, "test");
        case.degraded = false;
        case.confidence = 0.6;
        case.claims = claims
            .iter()
            .enumerate()
            .map(|(i, (statement, confidence))| Claim {
                id: format!("{}-{}", role.as_str(), i + 1),
                statement: (*statement).to_string(),
                evidence: String::new(),
                data_source: String::new(),
                confidence: *confidence,
            })
            .collect();
        case
    }

    #[test]
    fn test_exact_and_fuzzy_targets() {
        let bear = case(
            Role::Bear,
            &[("Debt load is rising fast", 0.7), ("Margins are compressing", 0.6)],
        );
        let bull = case(Role::Bull, &[("Services revenue is growing", 0.8)]);

        let drafts = parse_drafts(json!({"rebuttals": [
            {"target_claim": "debt load is rising fast", "counter_argument": "Cash covers it", "strength": 0.5},
            {"target_claim": "Operating margins compressing badly", "counter_argument": "Mix shift", "strength": 0.4},
            {"target_claim": "CEO is leaving", "counter_argument": "No", "strength": 0.9}
        ]}));
        let rebuttals = resolve(drafts, &bear, &bull);

        assert_eq!(rebuttals.len(), 2);
        assert_eq!(rebuttals[0].target_claim_id, "bear-1");
        assert_eq!(rebuttals[1].target_claim_id, "bear-2");
        assert_eq!(rebuttals[1].target_statement, "Margins are compressing");
        assert!(rebuttals.iter().all(|r| r.author == Role::Bull));
    }

    #[test]
    fn test_strength_bounded_by_weakest_own_claim() {
        let bear = case(Role::Bear, &[("Valuation is stretched", 0.9)]);
        let bull = case(Role::Bull, &[("Growth is accelerating", 0.8), ("Buybacks support price", 0.35)]);

        let drafts = parse_drafts(json!([
            {"target_claim": "Valuation is stretched", "counter_argument": "Growth justifies it", "strength": 0.95}
        ]));
        let rebuttals = resolve(drafts, &bear, &bull);
        assert_eq!(rebuttals[0].strength, 0.35);
    }

    #[test]
    fn test_claimless_author_uses_case_confidence() {
        let bear = case(Role::Bear, &[("Valuation is stretched", 0.9)]);
        let bull = case(Role::Bull, &[]);
        let drafts = parse_drafts(json!([{"target_claim": "Valuation is stretched", "strength": 0.9}]));
        assert_eq!(resolve(drafts, &bear, &bull)[0].strength, 0.6);
    }

    #[test]
    fn test_malformed_items_are_skipped() {
        let drafts = parse_drafts(json!([{"strength": 0.3}, {"target_claim": "x"}, 7]));
        assert_eq!(drafts.len(), 1);
        assert!(parse_drafts(json!("nope")).is_empty());
    }

    #[test]
    fn test_counter_evidence_flag() {
        let rebuttal = Rebuttal {
            author: Role::Bear,
            target_claim_id: "bull-1".into(),
            target_statement: "s".into(),
            counter_argument: "c".into(),
            counter_evidence: Some("Margins fell 2 points".into()),
            strength: 0.4,
        };
        assert!(rebuttal.has_counter_evidence());
    }
}
