//! Execution port bridging runs to the job body.

use crate::run::domain::{Run, RunOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for run executor operations.
pub type RunExecutorResult<T> = Result<T, RunExecutorError>;

/// Contract for executing a run's job body.
///
/// An `Err` means the body could not be reached and the execution task
/// should be retried; a returned [`RunOutcome::Failure`] means the body ran
/// and reported failure, which finalizes the run.
#[async_trait]
pub trait RunExecutor: Send + Sync {
    /// Executes the job body for `run` and reports its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RunExecutorError`] when the body could not be invoked.
    async fn execute(&self, run: &Run) -> RunExecutorResult<RunOutcome>;
}

/// Errors returned by run executor implementations.
#[derive(Debug, Clone, Error)]
pub enum RunExecutorError {
    /// No executor is bound for the run's job.
    #[error("no executor bound for job {0}")]
    UnknownJob(String),

    /// The job body could not be reached.
    #[error("execution transport error: {0}")]
    Transport(Arc<dyn std::error::Error + Send + Sync>),
}

impl RunExecutorError {
    /// Wraps a transport-layer error.
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Arc::new(err))
    }
}
