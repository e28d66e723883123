//! Configuration for the reasoning-action loop

use serde::{Deserialize, Serialize};
use verdict_core::{Result, VerdictError};

/// Limits and tool arguments for one loop run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfig {
    /// Hard stop; a run reaching it ends `IterationCapped`
    pub max_iterations: usize,

    /// How far back to fetch headlines
    pub headline_days: u32,

    /// Price history period, e.g. "1mo"
    pub price_period: String,

    /// Hand the finished result to the persistence tool when one is registered
    pub persist_results: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            max_iterations: 8,
            headline_days: 7,
            price_period: "1mo".to_string(),
            persist_results: true,
        }
    }
}

impl LoopConfig {
    pub fn builder() -> LoopConfigBuilder {
        LoopConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(VerdictError::ConfigError(
                "max_iterations must be greater than 0".to_string(),
            ));
        }
        if self.headline_days == 0 {
            return Err(VerdictError::ConfigError(
                "headline_days must be greater than 0".to_string(),
            ));
        }
        if self.price_period.trim().is_empty() {
            return Err(VerdictError::ConfigError(
                "price_period must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for LoopConfig
#[derive(Debug, Default)]
pub struct LoopConfigBuilder {
    max_iterations: Option<usize>,
    headline_days: Option<u32>,
    price_period: Option<String>,
    persist_results: Option<bool>,
}

impl LoopConfigBuilder {
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
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

    pub fn persist_results(mut self, persist: bool) -> Self {
        self.persist_results = Some(persist);
        self
    }

    /// Build and validate
    pub fn build(self) -> Result<LoopConfig> {
        let defaults = LoopConfig::default();
        let config = LoopConfig {
            max_iterations: self.max_iterations.unwrap_or(defaults.max_iterations),
            headline_days: self.headline_days.unwrap_or(defaults.headline_days),
            price_period: self.price_period.unwrap_or(defaults.price_period),
            persist_results: self.persist_results.unwrap_or(defaults.persist_results),
        };
        config.validate()?;
        Ok(config)
    }
}
