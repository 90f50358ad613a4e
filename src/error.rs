//! Error types for the simulation core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Errors raised by the simulation core.
///
/// Every failure is a deterministic function of the input; nothing here is
/// transient and nothing is retried.
#[derive(Debug, Error)]
pub enum SimError {
    /// A caller-supplied parameter is outside its valid domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The test oracle could not produce a p-value for a sample pair.
    #[error("test oracle failed: {0}")]
    Oracle(String),

    /// Filesystem failure reading settings or writing output.
    #[error("i/o error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization error
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (de)serialization error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn oracle(message: impl Into<String>) -> Self {
        Self::Oracle(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}
