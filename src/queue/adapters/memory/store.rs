//! In-memory queue store for tests and embedded use.
//!
//! Every operation runs under one mutex, which is what makes the claim scan
//! indivisible: the eligibility check, the per-queue exclusivity check, and
//! the status flip happen while no other caller can observe the state.

use crate::queue::domain::{
    FailureOutcome, QueueName, RetryPolicy, TaskInstance, TaskInstanceId, TaskStatus, WorkerId,
};
use crate::queue::ports::{QueueStore, QueueStoreError, QueueStoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// Thread-safe in-memory queue store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryQueueStore {
    state: Arc<Mutex<InMemoryQueueState>>,
    retry_policy: RetryPolicy,
}

#[derive(Debug, Default)]
struct InMemoryQueueState {
    instances: HashMap<TaskInstanceId, TaskInstance>,
    /// Monotonic arrival order, the FIFO tie-break within equal
    /// `(priority, created_at)`.
    arrival: HashMap<TaskInstanceId, u64>,
    next_seq: u64,
}

impl InMemoryQueueStore {
    /// Creates an empty store with the default retry policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store with an explicit retry policy.
    #[must_use]
    pub fn with_retry_policy(retry_policy: RetryPolicy) -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryQueueState::default())),
            retry_policy,
        }
    }

    fn lock(&self) -> QueueStoreResult<std::sync::MutexGuard<'_, InMemoryQueueState>> {
        self.state
            .lock()
            .map_err(|err| QueueStoreError::persistence(std::io::Error::other(err.to_string())))
    }
}

/// Picks the claim candidate: highest priority, then oldest, then first
/// arrived, among claimable instances of unblocked queues.
fn select_candidate(
    state: &InMemoryQueueState,
    now: DateTime<Utc>,
) -> Option<TaskInstanceId> {
    let busy_queues: HashSet<&QueueName> = state
        .instances
        .values()
        .filter(|instance| instance.status() == TaskStatus::InFlight)
        .map(TaskInstance::queue_name)
        .collect();

    state
        .instances
        .values()
        .filter(|instance| instance.is_claimable(now))
        .filter(|instance| !busy_queues.contains(instance.queue_name()))
        .min_by_key(|instance| {
            (
                std::cmp::Reverse(instance.priority()),
                instance.created_at(),
                state.arrival.get(&instance.id()).copied().unwrap_or(u64::MAX),
            )
        })
        .map(TaskInstance::id)
}

#[async_trait]
impl QueueStore for InMemoryQueueStore {
    async fn insert(&self, instance: &TaskInstance) -> QueueStoreResult<()> {
        let mut state = self.lock()?;
        if state.instances.contains_key(&instance.id()) {
            return Err(QueueStoreError::DuplicateInstance(instance.id()));
        }
        let seq = state.next_seq;
        state.next_seq = state.next_seq.saturating_add(1);
        state.arrival.insert(instance.id(), seq);
        state.instances.insert(instance.id(), instance.clone());
        Ok(())
    }

    async fn claim_next(
        &self,
        _worker: &WorkerId,
        now: DateTime<Utc>,
        visibility_timeout: Duration,
    ) -> QueueStoreResult<Option<TaskInstance>> {
        let mut state = self.lock()?;
        let Some(candidate_id) = select_candidate(&state, now) else {
            return Ok(None);
        };
        let instance = state
            .instances
            .get_mut(&candidate_id)
            .ok_or(QueueStoreError::NotFound(candidate_id))?;
        instance.claim(visibility_timeout, now)?;
        Ok(Some(instance.clone()))
    }

    async fn complete(&self, id: TaskInstanceId, now: DateTime<Utc>) -> QueueStoreResult<()> {
        let mut state = self.lock()?;
        let instance = state
            .instances
            .get_mut(&id)
            .ok_or(QueueStoreError::NotFound(id))?;
        instance.succeed(now)?;
        Ok(())
    }

    async fn fail(
        &self,
        id: TaskInstanceId,
        error: &str,
        now: DateTime<Utc>,
    ) -> QueueStoreResult<FailureOutcome> {
        let mut state = self.lock()?;
        let instance = state
            .instances
            .get_mut(&id)
            .ok_or(QueueStoreError::NotFound(id))?;
        let outcome = instance.record_failure(error, &self.retry_policy, now)?;
        Ok(outcome)
    }

    async fn reap(&self, now: DateTime<Utc>) -> QueueStoreResult<Vec<TaskInstanceId>> {
        let mut state = self.lock()?;
        let mut reclaimed = Vec::new();
        for instance in state.instances.values_mut() {
            if instance.is_expired(now) {
                instance.expire(&self.retry_policy, now)?;
                reclaimed.push(instance.id());
            }
        }
        Ok(reclaimed)
    }

    async fn find_by_id(&self, id: TaskInstanceId) -> QueueStoreResult<Option<TaskInstance>> {
        let state = self.lock()?;
        Ok(state.instances.get(&id).cloned())
    }

    async fn count_by_status(
        &self,
        queue: &QueueName,
        status: TaskStatus,
    ) -> QueueStoreResult<usize> {
        let state = self.lock()?;
        Ok(state
            .instances
            .values()
            .filter(|instance| instance.queue_name() == queue && instance.status() == status)
            .count())
    }
}
