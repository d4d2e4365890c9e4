//! Task instance aggregate and execution status machine.
//!
//! All status mutation flows through the methods here; the store adapters
//! load an instance, apply one lifecycle method, and write it back, so the
//! transition rules live in exactly one place.

use super::{
    ParseTaskStatusError, QueueDomainError, QueueName, RetryPolicy, TaskInstanceId, TaskKind,
};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Execution status of a task instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Waiting to be claimed.
    Pending,
    /// Claimed by a worker and executing.
    InFlight,
    /// Handler completed successfully.
    Succeeded,
    /// Handler failed; eligible again once the backoff delay passes.
    FailedRetryable,
    /// Attempts exhausted; terminal.
    FailedTerminal,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Succeeded => "succeeded",
            Self::FailedRetryable => "failed_retryable",
            Self::FailedTerminal => "failed_terminal",
        }
    }

    /// Returns `true` when a claim may take the instance, subject to its
    /// eligibility time.
    #[must_use]
    pub const fn is_claimable(self) -> bool {
        matches!(self, Self::Pending | Self::FailedRetryable)
    }

    /// Returns `true` when the instance reached a terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::FailedTerminal)
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "in_flight" => Ok(Self::InFlight),
            "succeeded" => Ok(Self::Succeeded),
            "failed_retryable" => Ok(Self::FailedRetryable),
            "failed_terminal" => Ok(Self::FailedTerminal),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of recording a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The instance will be retried once the backoff delay passes.
    Retrying {
        /// Earliest time the instance may be claimed again.
        next_eligible_at: DateTime<Utc>,
    },
    /// Attempts are exhausted; the instance is terminally failed.
    Exhausted,
}

/// One persisted occurrence of a task kind.
///
/// The payload was schema-validated at creation; no instance ever exists
/// with an invalid payload. The queue name was resolved once, at enqueue
/// time, and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskInstance {
    id: TaskInstanceId,
    kind: TaskKind,
    payload: Value,
    queue_name: QueueName,
    priority: i32,
    attempts: u32,
    max_attempts: u32,
    status: TaskStatus,
    last_error: Option<String>,
    eligible_at: DateTime<Utc>,
    visibility_deadline: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    last_attempted_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl TaskInstance {
    /// Creates a pending instance, immediately eligible.
    #[must_use]
    pub fn enqueued(
        id: TaskInstanceId,
        kind: TaskKind,
        payload: Value,
        queue_name: QueueName,
        priority: i32,
        max_attempts: u32,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id,
            kind,
            payload,
            queue_name,
            priority,
            attempts: 0,
            max_attempts,
            status: TaskStatus::Pending,
            last_error: None,
            eligible_at: timestamp,
            visibility_deadline: None,
            created_at: timestamp,
            last_attempted_at: None,
            updated_at: timestamp,
        }
    }

    /// Returns the instance identifier.
    #[must_use]
    pub const fn id(&self) -> TaskInstanceId {
        self.id
    }

    /// Returns the task kind.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Returns the serialized payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns the queue the instance is serialized under.
    #[must_use]
    pub const fn queue_name(&self) -> &QueueName {
        &self.queue_name
    }

    /// Returns the scheduling priority; higher is claimed sooner.
    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns the number of attempts recorded so far.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Returns the attempt ceiling.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the execution status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the most recent handler error, when one was recorded.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns the earliest time the instance may be claimed.
    #[must_use]
    pub const fn eligible_at(&self) -> DateTime<Utc> {
        self.eligible_at
    }

    /// Returns the visibility deadline stamped by the active claim.
    #[must_use]
    pub const fn visibility_deadline(&self) -> Option<DateTime<Utc>> {
        self.visibility_deadline
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the last attempt began, when one has.
    #[must_use]
    pub const fn last_attempted_at(&self) -> Option<DateTime<Utc>> {
        self.last_attempted_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when the instance may be claimed at `now`.
    #[must_use]
    pub fn is_claimable(&self, now: DateTime<Utc>) -> bool {
        self.status.is_claimable() && self.eligible_at <= now
    }

    /// Returns `true` when the instance is in flight past its visibility
    /// deadline, i.e. abandoned by a crashed or stalled worker.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == TaskStatus::InFlight
            && self.visibility_deadline.is_some_and(|deadline| deadline <= now)
    }

    /// Claims the instance: claimable → in flight, stamping the visibility
    /// deadline `now + visibility_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`QueueDomainError::InvalidTransition`] when the instance is
    /// not claimable.
    pub fn claim(
        &mut self,
        visibility_timeout: Duration,
        now: DateTime<Utc>,
    ) -> Result<(), QueueDomainError> {
        if !self.status.is_claimable() {
            return Err(self.invalid_transition());
        }
        self.status = TaskStatus::InFlight;
        self.visibility_deadline = Some(now + visibility_timeout);
        self.last_attempted_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Completes the instance: in flight → succeeded. The attempt that
    /// completed is counted here.
    ///
    /// # Errors
    ///
    /// Returns [`QueueDomainError::InvalidTransition`] when the instance is
    /// not in flight.
    pub fn succeed(&mut self, now: DateTime<Utc>) -> Result<(), QueueDomainError> {
        if self.status != TaskStatus::InFlight {
            return Err(self.invalid_transition());
        }
        self.attempts = self.attempts.saturating_add(1);
        self.status = TaskStatus::Succeeded;
        self.visibility_deadline = None;
        self.updated_at = now;
        Ok(())
    }

    /// Records a failed attempt: in flight → retryable with backoff, or
    /// terminal when attempts are exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`QueueDomainError::InvalidTransition`] when the instance is
    /// not in flight.
    pub fn record_failure(
        &mut self,
        error: &str,
        policy: &RetryPolicy,
        now: DateTime<Utc>,
    ) -> Result<FailureOutcome, QueueDomainError> {
        if self.status != TaskStatus::InFlight {
            return Err(self.invalid_transition());
        }
        self.last_error = Some(error.to_owned());
        Ok(self.settle_failed_attempt(TaskStatus::FailedRetryable, policy, now))
    }

    /// Reclaims an expired in-flight instance, counting the abandoned claim
    /// as an implicit failed attempt and returning it to pending (or
    /// terminal when exhausted).
    ///
    /// # Errors
    ///
    /// Returns [`QueueDomainError::InvalidTransition`] when the instance is
    /// not in flight past its deadline.
    pub fn expire(
        &mut self,
        policy: &RetryPolicy,
        now: DateTime<Utc>,
    ) -> Result<FailureOutcome, QueueDomainError> {
        if !self.is_expired(now) {
            return Err(self.invalid_transition());
        }
        self.last_error = Some("visibility deadline elapsed".to_owned());
        Ok(self.settle_failed_attempt(TaskStatus::Pending, policy, now))
    }

    /// Reconstructs a persisted instance.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskInstanceData) -> Self {
        Self {
            id: data.id,
            kind: data.kind,
            payload: data.payload,
            queue_name: data.queue_name,
            priority: data.priority,
            attempts: data.attempts,
            max_attempts: data.max_attempts,
            status: data.status,
            last_error: data.last_error,
            eligible_at: data.eligible_at,
            visibility_deadline: data.visibility_deadline,
            created_at: data.created_at,
            last_attempted_at: data.last_attempted_at,
            updated_at: data.updated_at,
        }
    }

    fn settle_failed_attempt(
        &mut self,
        retry_status: TaskStatus,
        policy: &RetryPolicy,
        now: DateTime<Utc>,
    ) -> FailureOutcome {
        self.attempts = self.attempts.saturating_add(1);
        self.visibility_deadline = None;
        self.updated_at = now;
        if self.attempts >= self.max_attempts {
            self.status = TaskStatus::FailedTerminal;
            return FailureOutcome::Exhausted;
        }
        let next_eligible_at = now + policy.delay_for(self.attempts);
        self.status = retry_status;
        self.eligible_at = next_eligible_at;
        FailureOutcome::Retrying { next_eligible_at }
    }

    const fn invalid_transition(&self) -> QueueDomainError {
        QueueDomainError::InvalidTransition {
            id: self.id,
            status: self.status,
        }
    }
}

/// Parameter object for reconstructing a persisted task instance.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedTaskInstanceData {
    /// Persisted instance identifier.
    pub id: TaskInstanceId,
    /// Persisted task kind.
    pub kind: TaskKind,
    /// Persisted payload.
    pub payload: Value,
    /// Persisted queue name.
    pub queue_name: QueueName,
    /// Persisted priority.
    pub priority: i32,
    /// Persisted attempt count.
    pub attempts: u32,
    /// Persisted attempt ceiling.
    pub max_attempts: u32,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted last handler error.
    pub last_error: Option<String>,
    /// Persisted eligibility time.
    pub eligible_at: DateTime<Utc>,
    /// Persisted visibility deadline.
    pub visibility_deadline: Option<DateTime<Utc>>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted last attempt timestamp.
    pub last_attempted_at: Option<DateTime<Utc>>,
    /// Persisted last update timestamp.
    pub updated_at: DateTime<Utc>,
}
