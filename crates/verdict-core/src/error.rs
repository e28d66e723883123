//! Error taxonomy shared across the workspace

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for core operations
pub type Result<T> = std::result::Result<T, VerdictError>;

/// Failure classes a run can end with
///
/// Every crate-level error maps onto one of these so that a terminal
/// `error` progress event can name the failure kind without knowing
/// which layer produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad ticker format or unknown symbol
    #[serde(rename = "validation_error")]
    Validation,
    /// A single tool failed
    #[serde(rename = "tool_error")]
    Tool,
    /// The model capability refused the call for now
    RateLimited,
    /// The model capability is not reachable at all
    ModelUnavailable,
    /// A debate case failed validation twice
    DebateAgentFailure,
    /// The caller cancelled the run
    Cancelled,
    /// Anything else
    Internal,
}

impl ErrorKind {
    /// Wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation_error",
            Self::Tool => "tool_error",
            Self::RateLimited => "rate_limited",
            Self::ModelUnavailable => "model_unavailable",
            Self::DebateAgentFailure => "debate_agent_failure",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        }
    }

    /// Whether this kind aborts a run outright
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Validation | Self::ModelUnavailable | Self::Cancelled | Self::Internal
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the core crate
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VerdictError {
    /// Ticker failed the format check
    #[error("Invalid ticker '{ticker}': {reason}")]
    InvalidTicker { ticker: String, reason: String },

    /// Ticker is well-formed but not a listed symbol
    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    /// Configuration failed validation
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Event could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The run was cancelled by its caller
    #[error("Run cancelled")]
    Cancelled,
}

impl VerdictError {
    /// Failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTicker { .. } | Self::UnknownTicker(_) => ErrorKind::Validation,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::ConfigError(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }
}

impl From<serde_json::Error> for VerdictError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
