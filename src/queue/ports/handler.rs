//! Handler contract task kinds are executed through.

use crate::queue::domain::{TaskKind, TaskPayload};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task handler invocations.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// One unit-of-work executor bound to a task kind.
///
/// Handlers may be re-run: a worker that exceeds its visibility deadline is
/// reclaimed even if the handler is still running, so implementations must
/// be idempotent or cheaply safe to repeat.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Executes one claimed instance's payload.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when the work fails; the queue classifies
    /// the failure only by attempt count, never by error type.
    async fn handle(&self, payload: TaskPayload) -> HandlerResult<()>;
}

/// Errors surfaced by task handlers.
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// The registry dispatched a payload variant the handler does not
    /// accept; indicates a wiring defect, not a payload defect.
    #[error("unexpected payload variant {kind} for this handler")]
    UnexpectedPayload {
        /// Kind of the payload that was dispatched.
        kind: TaskKind,
    },

    /// The handler's work failed.
    #[error("handler failed: {0}")]
    Failed(Arc<dyn std::error::Error + Send + Sync>),

    /// The handler's work failed with a bare message.
    #[error("handler failed: {0}")]
    Message(String),
}

impl HandlerError {
    /// Wraps a failure cause.
    pub fn failed(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Failed(Arc::new(err))
    }

    /// Creates a failure from a message.
    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}
