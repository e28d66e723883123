//! Tunable grading and mapping policy
//!
//! The weights, the scenario curve and the recommendation thresholds are
//! configuration, not constants; defaults are listed on each type.

use crate::{DebateError, Result};
use serde::{Deserialize, Serialize};

/// How a claim's credibility is computed
///
/// `credibility = (data_weight * support + confidence_weight * confidence)
///   * (1 - rebuttal_penalty * strongest_rebuttal)
///   * (1 - degraded_penalty)` when the side is degraded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingPolicy {
    /// 0.5
    pub data_weight: f64,
    /// 0.5
    pub confidence_weight: f64,
    /// 0.6
    pub rebuttal_penalty: f64,
    /// 0.5
    pub degraded_penalty: f64,
    /// Strength of a side with no claims before the degraded penalty; 0.5
    pub empty_side_strength: f64,
    /// Credibility band whose claims are reported as unresolved; [0.4, 0.6]
    pub ambiguous_band: (f64, f64),
}

impl Default for GradingPolicy {
    fn default() -> Self {
        Self {
            data_weight: 0.5,
            confidence_weight: 0.5,
            rebuttal_penalty: 0.6,
            degraded_penalty: 0.5,
            empty_side_strength: 0.5,
            ambiguous_band: (0.4, 0.6),
        }
    }
}

impl GradingPolicy {
    pub fn validate(&self) -> Result<()> {
        let unit = |v: f64| (0.0..=1.0).contains(&v);
        if !unit(self.data_weight) || !unit(self.confidence_weight) {
            return Err(DebateError::Config("grading weights must be in [0, 1]".into()));
        }
        if (self.data_weight + self.confidence_weight - 1.0).abs() > 1e-9 {
            return Err(DebateError::Config("grading weights must sum to 1".into()));
        }
        if !unit(self.rebuttal_penalty) || !unit(self.degraded_penalty) || !unit(self.empty_side_strength) {
            return Err(DebateError::Config("penalties must be in [0, 1]".into()));
        }
        let (low, high) = self.ambiguous_band;
        if !(unit(low) && unit(high) && low <= high) {
            return Err(DebateError::Config("ambiguous band must be an ordered range in [0, 1]".into()));
        }
        Ok(())
    }
}

/// Maps argument strength and outlook pressure to scenario probabilities
///
/// `score = strength_weight * (bull - bear) + outlook_weight * tilt`, with
/// `tilt = (catalysts - risks) / (catalysts + risks + 1)`. Then
/// `u = sigmoid(steepness * score)`, `bull = directional * u^2`,
/// `bear = directional * (1 - u)^2` and base takes the remainder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioCurve {
    /// 0.75
    pub strength_weight: f64,
    /// 0.25
    pub outlook_weight: f64,
    /// 3.0
    pub steepness: f64,
    /// Upper bound on bull + bear; 0.9
    pub directional_mass: f64,
}

impl Default for ScenarioCurve {
    fn default() -> Self {
        Self {
            strength_weight: 0.75,
            outlook_weight: 0.25,
            steepness: 3.0,
            directional_mass: 0.9,
        }
    }
}

impl ScenarioCurve {
    pub fn validate(&self) -> Result<()> {
        if self.strength_weight < 0.0 || self.outlook_weight < 0.0 {
            return Err(DebateError::Config("curve weights must be non-negative".into()));
        }
        if self.strength_weight <= 0.0 {
            return Err(DebateError::Config("strength_weight must be positive".into()));
        }
        if !(self.steepness > 0.0 && self.steepness.is_finite()) {
            return Err(DebateError::Config("steepness must be positive".into()));
        }
        if !(self.directional_mass > 0.0 && self.directional_mass <= 1.0) {
            return Err(DebateError::Config("directional_mass must be in (0, 1]".into()));
        }
        Ok(())
    }

    /// `(bull, base, bear)`, summing to 1
    pub fn probabilities(&self, strength_diff: f64, tilt: f64) -> (f64, f64, f64) {
        let score = self.strength_weight * strength_diff + self.outlook_weight * tilt;
        let u = 1.0 / (1.0 + (-self.steepness * score).exp());
        let bull = self.directional_mass * u * u;
        let bear = self.directional_mass * (1.0 - u) * (1.0 - u);
        (bull, 1.0 - bull - bear, bear)
    }
}

/// Five-point recommendation scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Sell")]
    StrongSell,
    Sell,
    Hold,
    Buy,
    #[serde(rename = "Strong Buy")]
    StrongBuy,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongSell => "Strong Sell",
            Self::Sell => "Sell",
            Self::Hold => "Hold",
            Self::Buy => "Buy",
            Self::StrongBuy => "Strong Buy",
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conviction thresholds for the five buckets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationScale {
    /// Below this the verdict is Hold; 0.15
    pub hold_below: f64,
    /// At or above this the verdict is Strong; 0.40
    pub strong_from: f64,
}

impl Default for RecommendationScale {
    fn default() -> Self {
        Self {
            hold_below: 0.15,
            strong_from: 0.40,
        }
    }
}

impl RecommendationScale {
    pub fn validate(&self) -> Result<()> {
        if !(0.0 <= self.hold_below && self.hold_below < self.strong_from && self.strong_from <= 1.0) {
            return Err(DebateError::Config(
                "recommendation thresholds must satisfy 0 <= hold_below < strong_from <= 1".into(),
            ));
        }
        Ok(())
    }

    /// Label for a probability spread; `direction` is bull minus bear
    pub fn classify(&self, conviction: f64, direction: f64) -> Recommendation {
        if conviction < self.hold_below {
            return Recommendation::Hold;
        }
        let strong = conviction >= self.strong_from;
        match (direction > 0.0, strong) {
            (true, true) => Recommendation::StrongBuy,
            (true, false) => Recommendation::Buy,
            (false, true) => Recommendation::StrongSell,
            (false, false) => Recommendation::Sell,
        }
    }
}
