//! Store port for durable task instance persistence and the claim protocol.

use crate::queue::domain::{
    FailureOutcome, QueueDomainError, QueueName, TaskInstance, TaskInstanceId, TaskStatus,
    WorkerId,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for queue store operations.
pub type QueueStoreResult<T> = Result<T, QueueStoreError>;

/// Transactional persistence contract for task instances.
///
/// The store is the single source of truth for what work exists; no other
/// component mutates instance status. `claim_next` must be indivisible:
/// under arbitrary concurrent callers, no two callers receive the same
/// instance and no two instances of the same queue are in flight together.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Persists a freshly enqueued pending instance.
    ///
    /// # Errors
    ///
    /// Returns [`QueueStoreError::DuplicateInstance`] when the identifier
    /// already exists.
    async fn insert(&self, instance: &TaskInstance) -> QueueStoreResult<()>;

    /// Atomically claims the highest-priority, oldest eligible instance
    /// from among queues with no in-flight instance, stamping its
    /// visibility deadline at `now + visibility_timeout`.
    ///
    /// Returns `None` when no instance is eligible.
    ///
    /// # Errors
    ///
    /// Returns [`QueueStoreError::Persistence`] on backing-store failure.
    /// Lost claim races are retried internally and never surfaced.
    async fn claim_next(
        &self,
        worker: &WorkerId,
        now: DateTime<Utc>,
        visibility_timeout: Duration,
    ) -> QueueStoreResult<Option<TaskInstance>>;

    /// Marks an in-flight instance succeeded, releasing its queue.
    ///
    /// # Errors
    ///
    /// Returns [`QueueStoreError::NotFound`] when the instance does not
    /// exist or [`QueueStoreError::Domain`] when it is not in flight.
    async fn complete(&self, id: TaskInstanceId, now: DateTime<Utc>) -> QueueStoreResult<()>;

    /// Records a failed attempt on an in-flight instance, applying the
    /// retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`QueueStoreError::NotFound`] when the instance does not
    /// exist or [`QueueStoreError::Domain`] when it is not in flight.
    async fn fail(
        &self,
        id: TaskInstanceId,
        error: &str,
        now: DateTime<Utc>,
    ) -> QueueStoreResult<FailureOutcome>;

    /// Returns every in-flight instance whose visibility deadline elapsed
    /// to pending (terminal when exhausted), counting an implicit failed
    /// attempt, and reports the reclaimed identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`QueueStoreError::Persistence`] on backing-store failure.
    async fn reap(&self, now: DateTime<Utc>) -> QueueStoreResult<Vec<TaskInstanceId>>;

    /// Finds an instance by identifier.
    ///
    /// Returns `None` when the instance does not exist.
    async fn find_by_id(&self, id: TaskInstanceId) -> QueueStoreResult<Option<TaskInstance>>;

    /// Counts instances of a queue holding the given status.
    ///
    /// # Errors
    ///
    /// Returns [`QueueStoreError::Persistence`] on backing-store failure.
    async fn count_by_status(
        &self,
        queue: &QueueName,
        status: TaskStatus,
    ) -> QueueStoreResult<usize>;
}

/// Errors returned by queue store implementations.
#[derive(Debug, Clone, Error)]
pub enum QueueStoreError {
    /// An instance with the same identifier already exists.
    #[error("duplicate task instance: {0}")]
    DuplicateInstance(TaskInstanceId),

    /// The instance was not found.
    #[error("task instance not found: {0}")]
    NotFound(TaskInstanceId),

    /// A lifecycle rule rejected the mutation.
    #[error(transparent)]
    Domain(#[from] QueueDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl QueueStoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
