//! Enqueue port used by everything that publishes work.
//!
//! The run state machine, the event pipeline, and outer collaborators all
//! publish through this trait; none of them see queue internals.

use crate::queue::domain::{QueueDomainError, TaskInstanceId, TaskPayload, ValidationError};
use crate::queue::ports::QueueStoreError;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for enqueue operations.
pub type EnqueueResult<T> = Result<T, EnqueueError>;

/// Per-call overrides of the catalog's execution policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnqueueOptions {
    priority: Option<i32>,
    max_attempts: Option<u32>,
}

impl EnqueueOptions {
    /// Creates options deferring entirely to the catalog.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            priority: None,
            max_attempts: None,
        }
    }

    /// Overrides the scheduling priority for this instance.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Overrides the attempt ceiling for this instance.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Returns the priority override, when set.
    #[must_use]
    pub const fn priority(&self) -> Option<i32> {
        self.priority
    }

    /// Returns the attempt ceiling override, when set.
    #[must_use]
    pub const fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }
}

/// Publishing contract of the queue.
#[async_trait]
pub trait Enqueuer: Send + Sync {
    /// Persists one pending instance of an already-typed payload.
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError`] when routing or persistence fails.
    async fn enqueue(
        &self,
        payload: TaskPayload,
        options: EnqueueOptions,
    ) -> EnqueueResult<TaskInstanceId>;
}

/// Errors returned while enqueuing.
#[derive(Debug, Error)]
pub enum EnqueueError {
    /// The payload violated its kind's schema; nothing was persisted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Routing or policy rules rejected the instance.
    #[error(transparent)]
    Domain(#[from] QueueDomainError),

    /// The payload could not be serialized for persistence.
    #[error("payload serialization failed: {0}")]
    Serialization(Arc<serde_json::Error>),

    /// The store rejected the instance.
    #[error(transparent)]
    Store(#[from] QueueStoreError),
}
