//! Error types for queue domain validation and parsing.

use super::{TaskInstanceId, TaskKind, TaskStatus};
use thiserror::Error;

/// Errors returned while mutating or routing queue domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueueDomainError {
    /// A lifecycle method was called on an instance in the wrong status.
    #[error("task instance {id} cannot transition out of status {status}")]
    InvalidTransition {
        /// Instance the transition was attempted on.
        id: TaskInstanceId,
        /// Status the instance currently holds.
        status: TaskStatus,
    },

    /// A task definition was built with fewer than one allowed attempt.
    #[error("task kind {0} must allow at least one attempt")]
    InvalidMaxAttempts(TaskKind),

    /// A per-resource routing rule found no resource key in the payload.
    #[error("task kind {0} routes per resource but its payload carries no resource key")]
    MissingResourceKey(TaskKind),
}

/// Payload schema validation failure, raised at enqueue time before any
/// instance is persisted.
#[derive(Debug, Error)]
#[error("invalid payload for task kind {kind}: {source}")]
pub struct ValidationError {
    /// Task kind whose schema the payload violated.
    pub kind: TaskKind,
    /// Underlying deserialization failure.
    #[source]
    pub source: serde_json::Error,
}

/// Error returned while parsing task statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing task kinds from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task kind: {0}")]
pub struct ParseTaskKindError(pub String);
