//! In-memory dispatcher repository.

use crate::event::domain::{Dispatcher, DispatcherId, EndpointId};
use crate::event::ports::{
    DispatcherRepository, DispatcherRepositoryError, DispatcherRepositoryResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory dispatcher repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDispatcherRepository {
    state: Arc<RwLock<HashMap<DispatcherId, Dispatcher>>>,
}

impl InMemoryDispatcherRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned(err: impl std::fmt::Display) -> DispatcherRepositoryError {
    DispatcherRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl DispatcherRepository for InMemoryDispatcherRepository {
    async fn upsert(&self, dispatcher: &Dispatcher) -> DispatcherRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        state.insert(dispatcher.id().clone(), dispatcher.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &DispatcherId,
    ) -> DispatcherRepositoryResult<Option<Dispatcher>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.get(id).cloned())
    }

    async fn find_by_key(
        &self,
        endpoint_id: &EndpointId,
        slug: &str,
    ) -> DispatcherRepositoryResult<Option<Dispatcher>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .values()
            .find(|dispatcher| dispatcher.endpoint_id() == endpoint_id && dispatcher.slug() == slug)
            .cloned())
    }

    async fn find_matching(
        &self,
        event_name: &str,
    ) -> DispatcherRepositoryResult<Vec<Dispatcher>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        let mut matching: Vec<Dispatcher> = state
            .values()
            .filter(|dispatcher| dispatcher.matches_event(event_name))
            .cloned()
            .collect();
        matching.sort_by_key(Dispatcher::created_at);
        Ok(matching)
    }
}
