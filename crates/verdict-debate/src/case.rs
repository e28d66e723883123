//! One side's structured investment case

use crate::Role;
use serde::{Deserialize, Serialize};

/// When a catalyst or risk is expected to play out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Timeframe {
    #[serde(rename = "near-term")]
    NearTerm,
    #[default]
    #[serde(rename = "medium-term")]
    MediumTerm,
    #[serde(rename = "long-term")]
    LongTerm,
}

/// Impact or severity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Level {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl TryFrom<String> for Timeframe {
    type Error = String;

    /// Case-insensitive; "short term", "Near-Term" and "near_term" all parse
    fn try_from(value: String) -> Result<Self, Self::Error> {
        let key: String = value
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(char::is_ascii_alphabetic)
            .collect();
        match key.as_str() {
            "nearterm" | "shortterm" | "near" | "short" => Ok(Self::NearTerm),
            "mediumterm" | "midterm" | "medium" | "mid" => Ok(Self::MediumTerm),
            "longterm" | "long" => Ok(Self::LongTerm),
            _ => Err(format!("unknown timeframe '{value}'")),
        }
    }
}

impl TryFrom<String> for Level {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" | "minor" => Ok(Self::Low),
            "medium" | "moderate" => Ok(Self::Medium),
            "high" | "major" => Ok(Self::High),
            "critical" | "severe" => Ok(Self::Critical),
            _ => Err(format!("unknown level '{value}'")),
        }
    }
}

impl Level {
    /// Weight in [0.25, 1.0]
    pub fn weight(&self) -> f64 {
        match self {
            Self::Low => 0.25,
            Self::Medium => 0.5,
            Self::High => 0.75,
            Self::Critical => 1.0,
        }
    }
}

fn half() -> f64 {
    0.5
}

/// A specific, checkable assertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// "bull-1", "bear-2", ...
    pub id: String,
    pub statement: String,
    #[serde(default)]
    pub evidence: String,
    /// Where the evidence comes from: fundamentals, headlines, price
    #[serde(default)]
    pub data_source: String,
    pub confidence: f64,
}

/// Something that could drive the stock up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalyst {
    pub description: String,
    #[serde(default)]
    pub timeframe: Timeframe,
    #[serde(default = "half")]
    pub probability: f64,
    #[serde(default, alias = "potential_impact")]
    pub impact: Level,
}

/// Something that could drive the stock down
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub severity: Level,
    #[serde(default = "half")]
    pub probability: f64,
    #[serde(default)]
    pub timeframe: Timeframe,
}

/// A drafted case; immutable once returned by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Case {
    pub ticker: String,
    pub role: Role,
    pub thesis: String,
    pub claims: Vec<Claim>,
    /// Filled by the bull side
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub catalysts: Vec<Catalyst>,
    /// Filled by the bear side
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub risks: Vec<Risk>,
    /// Points the agent concedes it cannot refute
    pub weaknesses: Vec<String>,
    pub confidence: f64,
    /// Placeholder after two invalid drafts
    #[serde(default)]
    pub degraded: bool,
    /// Confidence capped because the agent conceded nothing
    #[serde(default)]
    pub low_confidence: bool,
}

impl Case {
    /// Placeholder used when no valid case could be drafted
    pub fn degraded(ticker: impl Into<String>, role: Role, reason: &str) -> Self {
        Self {
            ticker: ticker.into(),
            role,
            thesis: format!("{role} case unavailable: {reason}"),
            claims: Vec::new(),
            catalysts: Vec::new(),
            risks: Vec::new(),
            weaknesses: vec!["Automated analysis could not produce a valid case".to_string()],
            confidence: 0.0,
            degraded: true,
            low_confidence: false,
        }
    }

    /// Cap confidences and concede the automated origin
    pub fn into_low_confidence(mut self, cap: f64) -> Self {
        self.confidence = self.confidence.min(cap);
        for claim in &mut self.claims {
            claim.confidence = claim.confidence.min(cap);
        }
        self.weaknesses.push(
            "Automated analysis: no weakness was conceded, so this case is treated as low confidence"
                .to_string(),
        );
        self.low_confidence = true;
        self
    }

    pub fn claim(&self, id: &str) -> Option<&Claim> {
        self.claims.iter().find(|c| c.id == id)
    }

    /// Weakest self-reported confidence; the case confidence when there
    /// are no claims
    pub fn min_claim_confidence(&self) -> f64 {
        self.claims
            .iter()
            .map(|c| c.confidence)
            .reduce(f64::min)
            .unwrap_or(self.confidence)
    }

    /// Sum of probability times impact over catalysts or risks
    pub fn outlook_pressure(&self) -> f64 {
        match self.role {
            Role::Bull => self
                .catalysts
                .iter()
                .map(|c| c.probability * c.impact.weight())
                .sum(),
            Role::Bear => self
                .risks
                .iter()
                .map(|r| r.probability * r.severity.weight())
                .sum(),
        }
    }
}

/// Raw model answer for a case
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CaseDraft {
    #[serde(default)]
    pub thesis: String,
    #[serde(default, alias = "key_claims")]
    pub claims: Vec<ClaimDraft>,
    #[serde(default)]
    pub catalysts: Vec<Catalyst>,
    #[serde(default)]
    pub risks: Vec<Risk>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default = "half")]
    pub confidence: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ClaimDraft {
    #[serde(default)]
    pub statement: String,
    #[serde(default)]
    pub evidence: String,
    #[serde(default)]
    pub data_source: String,
    #[serde(default = "half")]
    pub confidence: f64,
}

impl CaseDraft {
    /// First schema violation, if any
    pub fn problem(&self, role: Role) -> Option<String> {
        let in_range = |v: f64| (0.0..=1.0).contains(&v);
        if self.thesis.trim().is_empty() {
            return Some("thesis is missing".to_string());
        }
        match role {
            Role::Bull if self.catalysts.is_empty() => {
                return Some("catalyst list is empty".to_string());
            }
            Role::Bear if self.risks.is_empty() => {
                return Some("risk list is empty".to_string());
            }
            _ => {}
        }
        if !in_range(self.confidence) {
            return Some(format!("confidence {} outside [0, 1]", self.confidence));
        }
        if let Some(claim) = self.claims.iter().find(|c| !in_range(c.confidence)) {
            return Some(format!("claim confidence {} outside [0, 1]", claim.confidence));
        }
        let probabilities = self
            .catalysts
            .iter()
            .map(|c| c.probability)
            .chain(self.risks.iter().map(|r| r.probability));
        for p in probabilities {
            if !in_range(p) {
                return Some(format!("probability {p} outside [0, 1]"));
            }
        }
        None
    }

    pub fn concedes_weakness(&self) -> bool {
        self.weaknesses.iter().any(|w| !w.trim().is_empty())
    }

    /// Number the claims and drop empty statements
    pub fn into_case(self, ticker: &str, role: Role) -> Case {
        let claims = self
            .claims
            .into_iter()
            .filter(|c| !c.statement.trim().is_empty())
            .enumerate()
            .map(|(i, c)| Claim {
                id: format!("{}-{}", role.as_str(), i + 1),
                statement: c.statement.trim().to_string(),
                evidence: c.evidence,
                data_source: c.data_source,
                confidence: c.confidence,
            })
            .collect();
        Case {
            ticker: ticker.to_string(),
            role,
            thesis: self.thesis.trim().to_string(),
            claims,
            catalysts: self.catalysts,
            risks: self.risks,
            weaknesses: self
                .weaknesses
                .into_iter()
                .filter(|w| !w.trim().is_empty())
                .collect(),
            confidence: self.confidence,
            degraded: false,
            low_confidence: false,
        }
    }
}
