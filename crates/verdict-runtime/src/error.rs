//! Errors that end a loop run without a result

use thiserror::Error;
use verdict_core::{ErrorKind, VerdictError};
use verdict_tools::ToolError;

/// Result type for loop operations
pub type Result<T> = std::result::Result<T, LoopError>;

/// Why a run failed
///
/// Recoverable tool failures never surface here; they are recorded on the
/// result as failed invocations and warnings.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoopError {
    /// Ticker format or existence check failed
    #[error(transparent)]
    Validation(#[from] VerdictError),

    /// A tool failed in a way that aborts the run
    #[error("Tool '{tool}' failed: {source}")]
    Tool {
        tool: String,
        #[source]
        source: ToolError,
    },

    /// The engine was assembled without a tool it needs
    #[error("Engine misconfigured: {0}")]
    Config(String),

    /// The planner could not pick a step
    #[error("Planner failed: {0}")]
    Planner(String),

    /// The analysis store could not be read
    #[error("Analysis store failed: {0}")]
    Store(String),

    /// The caller cancelled the run
    #[error("Run cancelled")]
    Cancelled,
}

impl LoopError {
    /// Failure class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(err) => err.kind(),
            Self::Tool { source, .. } => source.kind(),
            Self::Planner(_) | Self::Store(_) => ErrorKind::Tool,
            Self::Config(_) => ErrorKind::Internal,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}
