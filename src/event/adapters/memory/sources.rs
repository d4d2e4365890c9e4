//! In-memory source repository.

use crate::event::domain::{EndpointId, Source, SourceId};
use crate::event::ports::{SourceRepository, SourceRepositoryError, SourceRepositoryResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory source repository.
#[derive(Debug, Clone, Default)]
pub struct InMemorySourceRepository {
    state: Arc<RwLock<HashMap<SourceId, Source>>>,
}

impl InMemorySourceRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned(err: impl std::fmt::Display) -> SourceRepositoryError {
    SourceRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl SourceRepository for InMemorySourceRepository {
    async fn upsert(&self, source: &Source) -> SourceRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        state.insert(source.id().clone(), source.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &SourceId) -> SourceRepositoryResult<Option<Source>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.get(id).cloned())
    }

    async fn find_by_key(
        &self,
        endpoint_id: &EndpointId,
        key: &str,
    ) -> SourceRepositoryResult<Option<Source>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .values()
            .find(|source| source.endpoint_id() == endpoint_id && source.key() == key)
            .cloned())
    }
}
