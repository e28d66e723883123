//! Configuration for a debate run

use crate::{DebateError, EmphasisProfile, GradingPolicy, RecommendationScale, Result, ScenarioCurve};
use serde::{Deserialize, Serialize};

/// Everything that shapes a debate apart from its collaborators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateConfig {
    /// Model used for drafting and rebuttals
    pub model: String,
    pub max_tokens: usize,

    pub bull_profile: EmphasisProfile,
    pub bear_profile: EmphasisProfile,

    pub grading: GradingPolicy,
    pub curve: ScenarioCurve,
    pub scale: RecommendationScale,

    /// Claims reported as decisive factors
    pub decisive_factor_count: usize,

    /// Confidence cap for a case that conceded no weakness
    pub low_confidence_cap: f64,

    pub headline_days: u32,
    pub price_period: String,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            bull_profile: EmphasisProfile::bull(),
            bear_profile: EmphasisProfile::bear(),
            grading: GradingPolicy::default(),
            curve: ScenarioCurve::default(),
            scale: RecommendationScale::default(),
            decisive_factor_count: 3,
            low_confidence_cap: 0.3,
            headline_days: 7,
            price_period: "1mo".to_string(),
        }
    }
}

impl DebateConfig {
    pub fn builder() -> DebateConfigBuilder {
        DebateConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(DebateError::Config("model must not be empty".to_string()));
        }
        if self.max_tokens == 0 {
            return Err(DebateError::Config("max_tokens must be greater than 0".to_string()));
        }
        if self.decisive_factor_count == 0 {
            return Err(DebateError::Config(
                "decisive_factor_count must be greater than 0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.low_confidence_cap) {
            return Err(DebateError::Config("low_confidence_cap must be in [0, 1]".to_string()));
        }
        if self.headline_days == 0 {
            return Err(DebateError::Config("headline_days must be greater than 0".to_string()));
        }
        if self.price_period.trim().is_empty() {
            return Err(DebateError::Config("price_period must not be empty".to_string()));
        }
        self.grading.validate()?;
        self.curve.validate()?;
        self.scale.validate()
    }
}

/// Builder for DebateConfig
#[derive(Debug, Default)]
pub struct DebateConfigBuilder {
    model: Option<String>,
    max_tokens: Option<usize>,
    grading: Option<GradingPolicy>,
    curve: Option<ScenarioCurve>,
    scale: Option<RecommendationScale>,
    decisive_factor_count: Option<usize>,
    low_confidence_cap: Option<f64>,
    headline_days: Option<u32>,
    price_period: Option<String>,
}

impl DebateConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn grading(mut self, grading: GradingPolicy) -> Self {
        self.grading = Some(grading);
        self
    }

    pub fn curve(mut self, curve: ScenarioCurve) -> Self {
        self.curve = Some(curve);
        self
    }

    pub fn scale(mut self, scale: RecommendationScale) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn decisive_factor_count(mut self, count: usize) -> Self {
        self.decisive_factor_count = Some(count);
        self
    }

    pub fn low_confidence_cap(mut self, cap: f64) -> Self {
        self.low_confidence_cap = Some(cap);
        self
    }

    pub fn headline_days(mut self, days: u32) -> Self {
        self.headline_days = Some(days);
        self
    }

    pub fn price_period(mut self, period: impl Into<String>) -> Self {
        self.price_period = Some(period.into());
        self
    }

    /// Build and validate
    pub fn build(self) -> Result<DebateConfig> {
        let defaults = DebateConfig::default();
        let config = DebateConfig {
            model: self.model.unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            bull_profile: defaults.bull_profile,
            bear_profile: defaults.bear_profile,
            grading: self.grading.unwrap_or(defaults.grading),
            curve: self.curve.unwrap_or(defaults.curve),
            scale: self.scale.unwrap_or(defaults.scale),
            decisive_factor_count: self
                .decisive_factor_count
                .unwrap_or(defaults.decisive_factor_count),
            low_confidence_cap: self.low_confidence_cap.unwrap_or(defaults.low_confidence_cap),
            headline_days: self.headline_days.unwrap_or(defaults.headline_days),
            price_period: self.price_period.unwrap_or(defaults.price_period),
        };
        config.validate()?;
        Ok(config)
    }
}
