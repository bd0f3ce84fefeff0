//! Crate-wide error taxonomy.
//!
//! Every fallible operation in the crate resolves to a [`RetrievalError`]:
//! the discriminated result callers branch on instead of catching ad-hoc
//! panics or downcasting boxed errors. The three variants mirror the three
//! failure classes of the system:
//!
//! - [`Configuration`](RetrievalError::Configuration) — invalid settings,
//!   raised once at construction and never retried.
//! - [`Validation`](RetrievalError::Validation) — a malformed request,
//!   rejected before any pipeline stage runs.
//! - [`Operation`](RetrievalError::Operation) — a stage or store failure at
//!   run time; the pipeline halts and returns this value in place of a
//!   `SearchResponse`.
//!
//! Operation messages are redacted: the human-readable `message` names the
//! failing stage without leaking backend detail. Full diagnostics are
//! emitted via `tracing::error!` at the boundary where the failure is
//! converted.

use thiserror::Error;

use crate::config::ConfigError;

/// The failure value returned in place of a pipeline result.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Invalid configuration detected at construction time.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// A malformed request, rejected before any stage ran.
    #[error("invalid search request: {reason}")]
    Validation {
        /// What was wrong with the request.
        reason: String,
    },

    /// A stage or store operation failed at run time.
    #[error("{stage} failed: {message}")]
    Operation {
        /// The stage or store operation that failed.
        stage: &'static str,
        /// Redacted, human-readable description.
        message: String,
    },
}

impl RetrievalError {
    /// Convenience constructor for a validation rejection.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for an operation failure.
    pub fn operation(stage: &'static str, message: impl Into<String>) -> Self {
        Self::Operation {
            stage,
            message: message.into(),
        }
    }

    /// Returns `true` for [`Configuration`](Self::Configuration) errors.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns `true` for [`Validation`](Self::Validation) errors.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns `true` for [`Operation`](Self::Operation) errors.
    #[must_use]
    pub fn is_operation(&self) -> bool {
        matches!(self, Self::Operation { .. })
    }
}
