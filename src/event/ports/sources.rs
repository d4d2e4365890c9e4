//! Repository port for ingestion source registrations.

use crate::event::domain::{EndpointId, Source, SourceId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for source repository operations.
pub type SourceRepositoryResult<T> = Result<T, SourceRepositoryError>;

/// Source persistence contract; writes are upserts keyed by identifier.
#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// Inserts or replaces a source registration.
    ///
    /// # Errors
    ///
    /// Returns [`SourceRepositoryError::Persistence`] when the write fails.
    async fn upsert(&self, source: &Source) -> SourceRepositoryResult<()>;

    /// Finds a source by identifier.
    ///
    /// Returns `None` when the source does not exist.
    async fn find_by_id(&self, id: &SourceId) -> SourceRepositoryResult<Option<Source>>;

    /// Finds a source by its idempotency key.
    ///
    /// Returns `None` when no registration exists for the endpoint and key.
    async fn find_by_key(
        &self,
        endpoint_id: &EndpointId,
        key: &str,
    ) -> SourceRepositoryResult<Option<Source>>;
}

/// Errors returned by source repository implementations.
#[derive(Debug, Clone, Error)]
pub enum SourceRepositoryError {
    /// The source was not found.
    #[error("source not found: {0}")]
    NotFound(SourceId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl SourceRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
