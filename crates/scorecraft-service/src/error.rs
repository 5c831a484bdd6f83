//! Service error taxonomy.
//!
//! Every failure maps to a stable, machine-checkable kind, distinct from
//! the human-readable message, so callers can branch without string
//! matching.

use thiserror::Error;

use scorecraft_core::formula::ValidationError;
use scorecraft_core::scoring::ScoringError;
use scorecraft_store::StoreError;

/// Failures surfaced by service operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// Missing or malformed request fields. Caller's fault; no retry.
    #[error("invalid request: {0}")]
    Input(String),

    /// No matching resource (game type, version, active configuration).
    #[error("not found: {0}")]
    NotFound(String),

    /// A submitted configuration contains an invalid formula.
    #[error("formula for competency '{competency}' is invalid: {source}")]
    Validation {
        competency: String,
        #[source]
        source: ValidationError,
    },

    /// A scoring pass aborted; identifies the failing competency.
    #[error(transparent)]
    Scoring(#[from] ScoringError),

    /// Opaque failure from a store collaborator, surfaced verbatim.
    #[error("persistence failure: {0}")]
    Persistence(String),
}

impl ServiceError {
    /// Stable error kind for machine checks.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Input(_) => "input_error",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Validation { .. } => "validation_error",
            ServiceError::Scoring(_) => "scoring_error",
            ServiceError::Persistence(_) => "persistence_error",
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NoActiveConfiguration(_) | StoreError::VersionNotFound(_) => {
                ServiceError::NotFound(err.to_string())
            }
            StoreError::UnknownSession(_) | StoreError::Persistence(_) => {
                ServiceError::Persistence(err.to_string())
            }
        }
    }
}
