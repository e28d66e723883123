//! Monitor errors

use crate::AlertStatus;
use thiserror::Error;
use verdict_core::ErrorKind;

/// Result type for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MonitorError {
    /// Alerts only leave `Pending`, and only once
    #[error("Cannot move alert from {from} to {to}")]
    InvalidTransition { from: AlertStatus, to: AlertStatus },

    /// The thesis store failed
    #[error("Thesis store error: {0}")]
    Store(String),

    /// Fresh analysis for a ticker could not be produced
    #[error("Analysis of {ticker} failed: {message}")]
    Analysis { ticker: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MonitorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTransition { .. } => ErrorKind::Validation,
            Self::Store(_) | Self::Analysis { .. } => ErrorKind::Tool,
            Self::Config(_) => ErrorKind::Internal,
        }
    }
}
