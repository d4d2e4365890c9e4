//! Port through which dispatchers start job runs.

use crate::run::domain::{JobId, RunId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for run starter operations.
pub type RunStarterResult<T> = Result<T, RunStarterError>;

/// Contract for creating a queued run for a job.
///
/// This is the only seam the dispatch pipeline crosses into run
/// orchestration; everything past run creation is the run lifecycle's
/// business.
#[async_trait]
pub trait RunStarter: Send + Sync {
    /// Creates a queued run for `job_id` and returns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`RunStarterError`] when the run could not be created.
    async fn create_run_for_job(&self, job_id: JobId) -> RunStarterResult<RunId>;
}

/// Errors returned by run starter implementations.
#[derive(Debug, Clone, Error)]
pub enum RunStarterError {
    /// The run could not be created.
    #[error("failed to start run: {0}")]
    Failed(Arc<dyn std::error::Error + Send + Sync>),
}

impl RunStarterError {
    /// Wraps a failure cause.
    pub fn failed(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Failed(Arc::new(err))
    }
}
