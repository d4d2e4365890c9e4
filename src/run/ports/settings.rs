//! Lookup port for per-job admission settings.

use crate::run::domain::JobId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for job settings lookups.
pub type JobSettingsResult<T> = Result<T, JobSettingsError>;

/// Contract for resolving per-job admission settings.
#[async_trait]
pub trait JobSettings: Send + Sync {
    /// Returns the job's concurrency ceiling, or `None` when the job is
    /// unlimited.
    ///
    /// # Errors
    ///
    /// Returns [`JobSettingsError`] when the lookup fails.
    async fn concurrency_limit(&self, job_id: &JobId) -> JobSettingsResult<Option<u32>>;
}

/// Errors returned by job settings implementations.
#[derive(Debug, Clone, Error)]
pub enum JobSettingsError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl JobSettingsError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
