//! Repository port for dispatcher registrations.

use crate::event::domain::{Dispatcher, DispatcherId, EndpointId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for dispatcher repository operations.
pub type DispatcherRepositoryResult<T> = Result<T, DispatcherRepositoryError>;

/// Dispatcher persistence contract.
///
/// Registrations are idempotent, so writes are upserts keyed by dispatcher
/// identifier; uniqueness of `(endpoint, slug)` is the caller's concern via
/// [`DispatcherRepository::find_by_key`].
#[async_trait]
pub trait DispatcherRepository: Send + Sync {
    /// Inserts or replaces a dispatcher registration.
    ///
    /// # Errors
    ///
    /// Returns [`DispatcherRepositoryError::Persistence`] when the write
    /// fails.
    async fn upsert(&self, dispatcher: &Dispatcher) -> DispatcherRepositoryResult<()>;

    /// Finds a dispatcher by identifier.
    ///
    /// Returns `None` when the dispatcher does not exist.
    async fn find_by_id(
        &self,
        id: &DispatcherId,
    ) -> DispatcherRepositoryResult<Option<Dispatcher>>;

    /// Finds a dispatcher by its idempotency key.
    ///
    /// Returns `None` when no registration exists for the endpoint and slug.
    async fn find_by_key(
        &self,
        endpoint_id: &EndpointId,
        slug: &str,
    ) -> DispatcherRepositoryResult<Option<Dispatcher>>;

    /// Returns every trigger dispatcher listening for the given event name.
    async fn find_matching(&self, event_name: &str)
    -> DispatcherRepositoryResult<Vec<Dispatcher>>;
}

/// Errors returned by dispatcher repository implementations.
#[derive(Debug, Clone, Error)]
pub enum DispatcherRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl DispatcherRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
