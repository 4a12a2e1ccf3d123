//! Error types for Circuity Core

use thiserror::Error;

/// Result type alias using Circuity's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Circuity error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Node not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Malformed metadata entry '{key}': {reason}")]
    MalformedMetadata { key: String, reason: String },

    #[error("No candidate edges")]
    NoCandidateEdges,

    #[error("Step ceiling of {limit} exceeded")]
    LimitExceeded { limit: usize },

    #[error("All {tries} tries exhausted")]
    RetriesExhausted { tries: usize },

    #[error("Search cancelled")]
    Cancelled,

    #[error("Validation error: {0}")]
    Validation(String),
}

impl Error {
    pub(crate) fn malformed(key: &str, reason: impl Into<String>) -> Self {
        Self::MalformedMetadata {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<crate::limits::ValidationError> for Error {
    fn from(err: crate::limits::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
