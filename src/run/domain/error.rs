//! Error types for run domain validation and parsing.

use super::RunStatus;
use thiserror::Error;

/// Errors returned while mutating run aggregates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RunDomainError {
    /// The requested status transition is not permitted by the lifecycle.
    #[error("invalid run transition from {from} to {to}")]
    InvalidTransition {
        /// Status the run currently holds.
        from: RunStatus,
        /// Status the transition attempted to reach.
        to: RunStatus,
    },

    /// Finalization was requested before an outcome was recorded.
    #[error("run {0} has no recorded outcome to finalize from")]
    MissingOutcome(String),
}

/// Error returned while parsing run statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown run status: {0}")]
pub struct ParseRunStatusError(pub String);
