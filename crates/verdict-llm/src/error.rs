//! Error types for model calls

use thiserror::Error;
use verdict_core::ErrorKind;

/// Result type for model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur when calling the model capability
#[derive(Error, Debug)]
pub enum ModelError {
    /// Quota exhausted, locally or upstream
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// The model cannot be reached at all
    #[error("Model unavailable: {0}")]
    Unavailable(String),

    /// Invalid API key or authentication failed
    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    /// The request was rejected as malformed
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The response did not have the expected shape
    #[error("Unexpected response format: {0}")]
    UnexpectedResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP error
    #[cfg(feature = "openai")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl ModelError {
    /// Failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::Unavailable(_) | Self::AuthenticationFailed | Self::ConfigurationError(_) => {
                ErrorKind::ModelUnavailable
            }
            #[cfg(feature = "openai")]
            Self::HttpError(_) => ErrorKind::ModelUnavailable,
            Self::InvalidRequest(_) | Self::UnexpectedResponse(_) | Self::SerializationError(_) => {
                ErrorKind::Tool
            }
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind() == ErrorKind::RateLimited
    }

    pub fn is_unavailable(&self) -> bool {
        self.kind() == ErrorKind::ModelUnavailable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert!(ModelError::RateLimited("429".into()).is_rate_limited());
        assert!(ModelError::Unavailable("down".into()).is_unavailable());
        assert!(ModelError::AuthenticationFailed.is_unavailable());
        assert_eq!(
            ModelError::UnexpectedResponse("no choices".into()).kind(),
            ErrorKind::Tool
        );
    }
}
