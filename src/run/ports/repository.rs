//! Repository port for run persistence and admission queries.

use crate::run::domain::{JobId, Run, RunId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for run repository operations.
pub type RunRepositoryResult<T> = Result<T, RunRepositoryError>;

/// Run persistence contract.
#[async_trait]
pub trait RunRepository: Send + Sync {
    /// Stores a new run.
    ///
    /// # Errors
    ///
    /// Returns [`RunRepositoryError::DuplicateRun`] when the run ID already
    /// exists.
    async fn store(&self, run: &Run) -> RunRepositoryResult<()>;

    /// Persists changes to an existing run (status, attempt, outcome,
    /// timestamps).
    ///
    /// # Errors
    ///
    /// Returns [`RunRepositoryError::NotFound`] when the run does not exist.
    async fn update(&self, run: &Run) -> RunRepositoryResult<()>;

    /// Finds a run by identifier.
    ///
    /// Returns `None` when the run does not exist.
    async fn find_by_id(&self, id: &RunId) -> RunRepositoryResult<Option<Run>>;

    /// Counts runs of a job currently holding a concurrency slot
    /// (`Starting` or `Executing`).
    async fn count_active(&self, job_id: &JobId) -> RunRepositoryResult<usize>;

    /// Returns up to `limit` queued runs of a job, oldest first.
    async fn oldest_queued(&self, job_id: &JobId, limit: usize) -> RunRepositoryResult<Vec<Run>>;
}

/// Errors returned by run repository implementations.
#[derive(Debug, Clone, Error)]
pub enum RunRepositoryError {
    /// A run with the same identifier already exists.
    #[error("duplicate run identifier: {0}")]
    DuplicateRun(RunId),

    /// The run was not found.
    #[error("run not found: {0}")]
    NotFound(RunId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl RunRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
