//! Application configuration
//!
//! Layers, lowest first: built-in defaults, an optional JSON file, then
//! environment variables. The result is validated as a whole.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use verdict_debate::DebateConfig;
use verdict_monitor::MonitorPolicy;
use verdict_runtime::LoopConfig;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// An environment variable held something unparseable
    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How to reach the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub model: String,
    pub max_tokens: usize,
    /// Client-side quota; calls over it fail as rate limited
    pub requests_per_minute: u32,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            requests_per_minute: 30,
            timeout_secs: 120,
            api_base: None,
            api_key: None,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid("max_tokens must be greater than 0".to_string()));
        }
        if self.requests_per_minute == 0 {
            return Err(ConfigError::Invalid(
                "requests_per_minute must be greater than 0".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be greater than 0".to_string()));
        }
        Ok(())
    }
}

/// Everything the `verdict` binary needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: ModelConfig,
    pub analysis: LoopConfig,
    pub debate: DebateConfig,
    pub monitor: MonitorPolicy,
    /// Progress events buffered for a slow observer before dropping
    pub event_buffer: usize,
    pub cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            analysis: LoopConfig::default(),
            debate: DebateConfig::default(),
            monitor: MonitorPolicy::default(),
            event_buffer: 64,
            cache_ttl_secs: 3600,
        }
    }
}

impl AppConfig {
    /// Defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = base.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON file; missing keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from variables found through `lookup`
    ///
    /// Recognised: `VERDICT_MAX_ITERATIONS`, `VERDICT_KILL_THRESHOLD`,
    /// `VERDICT_EVENT_BUFFER`, `VERDICT_CACHE_TTL_SECS`, `OPENAI_API_BASE`,
    /// `OPENAI_API_KEY`, `OPENAI_MODEL`. `OPENAI_MODEL` also sets the
    /// debate model.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = var("VERDICT_MAX_ITERATIONS") {
            self.analysis.max_iterations = parse_var("VERDICT_MAX_ITERATIONS", &value)?;
        }
        if let Some(value) = var("VERDICT_KILL_THRESHOLD") {
            self.monitor.threshold = parse_var("VERDICT_KILL_THRESHOLD", &value)?;
        }
        if let Some(value) = var("VERDICT_EVENT_BUFFER") {
            self.event_buffer = parse_var("VERDICT_EVENT_BUFFER", &value)?;
        }
        if let Some(value) = var("VERDICT_CACHE_TTL_SECS") {
            self.cache_ttl_secs = parse_var("VERDICT_CACHE_TTL_SECS", &value)?;
        }
        if let Some(value) = var("OPENAI_API_BASE") {
            self.model.api_base = Some(value.trim().to_string());
        }
        if let Some(value) = var("OPENAI_API_KEY") {
            self.model.api_key = Some(value);
        }
        if let Some(value) = var("OPENAI_MODEL") {
            let model = value.trim().to_string();
            self.debate.model.clone_from(&model);
            self.model.model = model;
        }
        Ok(self)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.analysis
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.debate
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.monitor
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.event_buffer == 0 {
            return Err(ConfigError::Invalid("event_buffer must be greater than 0".to_string()));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
