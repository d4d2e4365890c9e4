//! In-memory run repository.

use crate::run::domain::{JobId, Run, RunId, RunStatus};
use crate::run::ports::{RunRepository, RunRepositoryError, RunRepositoryResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory run repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRunRepository {
    state: Arc<RwLock<InMemoryRunState>>,
}

#[derive(Debug, Default)]
struct InMemoryRunState {
    runs: HashMap<RunId, Run>,
}

impl InMemoryRunRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_poisoned(err: impl std::fmt::Display) -> RunRepositoryError {
    RunRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl RunRepository for InMemoryRunRepository {
    async fn store(&self, run: &Run) -> RunRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        if state.runs.contains_key(run.id()) {
            return Err(RunRepositoryError::DuplicateRun(run.id().clone()));
        }
        state.runs.insert(run.id().clone(), run.clone());
        Ok(())
    }

    async fn update(&self, run: &Run) -> RunRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_poisoned)?;
        if !state.runs.contains_key(run.id()) {
            return Err(RunRepositoryError::NotFound(run.id().clone()));
        }
        state.runs.insert(run.id().clone(), run.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &RunId) -> RunRepositoryResult<Option<Run>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state.runs.get(id).cloned())
    }

    async fn count_active(&self, job_id: &JobId) -> RunRepositoryResult<usize> {
        let state = self.state.read().map_err(lock_poisoned)?;
        Ok(state
            .runs
            .values()
            .filter(|run| run.job_id() == job_id && run.status().is_active())
            .count())
    }

    async fn oldest_queued(&self, job_id: &JobId, limit: usize) -> RunRepositoryResult<Vec<Run>> {
        let state = self.state.read().map_err(lock_poisoned)?;
        let mut queued: Vec<Run> = state
            .runs
            .values()
            .filter(|run| run.job_id() == job_id && run.status() == RunStatus::Queued)
            .cloned()
            .collect();
        queued.sort_by_key(Run::created_at);
        queued.truncate(limit);
        Ok(queued)
    }
}
