//! Error types for tool invocations

use crate::sources::SourceError;
use thiserror::Error;
use verdict_core::{ErrorKind, VerdictError};
use verdict_llm::ModelError;

/// Result type for tool operations
pub type Result<T> = std::result::Result<T, ToolError>;

/// Errors a tool can report
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ToolError {
    /// Arguments did not match the tool's input schema
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// Ticker failed validation
    #[error("Invalid ticker: {0}")]
    InvalidTicker(String),

    /// A data source failed
    #[error("{source_name} failed for {ticker}: {reason}")]
    SourceFailed {
        source_name: String,
        ticker: String,
        reason: String,
    },

    /// The tool needs data the caller did not provide
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// The model refused the call for now
    #[error("Model rate limited: {0}")]
    RateLimited(String),

    /// The model cannot be reached
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// The model answered with something unusable
    #[error("Invalid model output: {0}")]
    InvalidOutput(String),

    /// Persistence rejected the write
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// No tool with this name is registered
    #[error("Tool not found: {0}")]
    NotFound(String),
}

impl ToolError {
    /// Failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTicker(_) => ErrorKind::Validation,
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            _ => ErrorKind::Tool,
        }
    }

    /// Whether this failure must abort the run
    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

impl From<ModelError> for ToolError {
    fn from(err: ModelError) -> Self {
        match err.kind() {
            ErrorKind::RateLimited => Self::RateLimited(err.to_string()),
            ErrorKind::ModelUnavailable => Self::ModelUnavailable(err.to_string()),
            _ => Self::InvalidOutput(err.to_string()),
        }
    }
}

impl From<VerdictError> for ToolError {
    fn from(err: VerdictError) -> Self {
        Self::InvalidTicker(err.to_string())
    }
}

impl ToolError {
    pub(crate) fn from_source(source_name: &str, ticker: &str, err: SourceError) -> Self {
        Self::SourceFailed {
            source_name: source_name.to_string(),
            ticker: ticker.to_string(),
            reason: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_error_conversion() {
        let err: ToolError = ModelError::RateLimited("429".into()).into();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(!err.is_fatal());

        let err: ToolError = ModelError::Unavailable("down".into()).into();
        assert!(err.is_fatal());

        let err: ToolError = ModelError::UnexpectedResponse("junk".into()).into();
        assert!(matches!(err, ToolError::InvalidOutput(_)));
    }

    #[test]
    fn test_invalid_ticker_is_fatal() {
        let err: ToolError = VerdictError::UnknownTicker("XXXX".into()).into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_source_failure_is_recoverable() {
        let err = ToolError::from_source("headlines", "AAPL", SourceError::Unavailable("timeout".into()));
        assert_eq!(err.kind(), ErrorKind::Tool);
        assert!(err.to_string().contains("timeout"));
    }
}
