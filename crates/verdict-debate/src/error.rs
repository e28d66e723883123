//! Errors that abort a debate

use thiserror::Error;
use verdict_core::{ErrorKind, VerdictError};
use verdict_llm::ModelError;
use verdict_tools::ToolError;

/// Result type for debate operations
pub type Result<T> = std::result::Result<T, DebateError>;

/// Why a debate failed
///
/// A side whose case cannot be validated is degraded, not failed; only
/// ticker validation, total model unavailability and cancellation end a
/// debate early.
#[derive(Debug, Error)]
pub enum DebateError {
    #[error(transparent)]
    Validation(#[from] VerdictError),

    /// The model cannot be reached at all
    #[error("Model unavailable during {stage}: {source}")]
    ModelUnavailable {
        stage: String,
        #[source]
        source: ModelError,
    },

    /// A data tool failed in a way that aborts the debate
    #[error("{stage} failed: {source}")]
    Tool {
        stage: String,
        #[source]
        source: ToolError,
    },

    /// A prompt template failed to render
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Invalid debate configuration
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Debate cancelled")]
    Cancelled,
}

impl DebateError {
    /// Failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(err) => err.kind(),
            Self::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            Self::Tool { source, .. } => source.kind(),
            Self::Prompt(_) | Self::Config(_) => ErrorKind::Internal,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub(crate) fn model(stage: impl Into<String>, source: ModelError) -> Self {
        Self::ModelUnavailable {
            stage: stage.into(),
            source,
        }
    }
}
