//! In-memory event record repository.

use crate::event::domain::{EventId, EventRecord};
use crate::event::ports::{EventRepository, EventRepositoryError, EventRepositoryResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory event repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventRepository {
    state: Arc<RwLock<HashMap<EventId, EventRecord>>>,
}

impl InMemoryEventRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned(err: impl std::fmt::Display) -> EventRepositoryError {
    EventRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn store(&self, event: &EventRecord) -> EventRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        if state.contains_key(event.id()) {
            return Err(EventRepositoryError::DuplicateEvent(event.id().clone()));
        }
        state.insert(event.id().clone(), event.clone());
        Ok(())
    }

    async fn update(&self, event: &EventRecord) -> EventRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        if !state.contains_key(event.id()) {
            return Err(EventRepositoryError::NotFound(event.id().clone()));
        }
        state.insert(event.id().clone(), event.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &EventId) -> EventRepositoryResult<Option<EventRecord>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.get(id).cloned())
    }
}
