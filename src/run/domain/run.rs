//! Run aggregate root and lifecycle state machine.
//!
//! A run advances `Queued → Starting → Executing → {Completed, Failed}`.
//! Every transition is driven by completion of a specific queue task
//! instance, never directly by an outer layer, and each mutating method
//! validates the transition before applying it.

use super::{JobId, ParseRunStatusError, RunDomainError, RunId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Run lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run is waiting for admission.
    Queued,
    /// Run passed admission and its execution task has been enqueued.
    Starting,
    /// The job body is executing.
    Executing,
    /// Run finished successfully.
    Completed,
    /// Run finished with a failure outcome.
    Failed,
}

impl RunStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Starting => "starting",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns `true` when the run still counts against the job's
    /// concurrency ceiling.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Starting | Self::Executing)
    }

    /// Returns `true` when the run reached a terminal status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns `true` when the lifecycle permits moving to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Starting)
                | (Self::Starting, Self::Executing)
                | (Self::Executing, Self::Completed | Self::Failed)
        )
    }
}

impl TryFrom<&str> for RunStatus {
    type Error = ParseRunStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "queued" => Ok(Self::Queued),
            "starting" => Ok(Self::Starting),
            "executing" => Ok(Self::Executing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseRunStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome recorded by the execution task before finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The job body completed and optionally produced output.
    Success {
        /// Output produced by the job body, if any.
        output: Option<Value>,
    },
    /// The job body failed.
    Failure {
        /// Error message reported by the job body.
        error: String,
    },
}

/// Run aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    id: RunId,
    job_id: JobId,
    status: RunStatus,
    attempt: u32,
    outcome: Option<RunOutcome>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    updated_at: DateTime<Utc>,
}

impl Run {
    /// Creates a queued run for a job.
    #[must_use]
    pub fn new(id: RunId, job_id: JobId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id,
            job_id,
            status: RunStatus::Queued,
            attempt: 0,
            outcome: None,
            created_at: timestamp,
            started_at: None,
            finished_at: None,
            updated_at: timestamp,
        }
    }

    /// Returns the run identifier.
    #[must_use]
    pub fn id(&self) -> &RunId {
        &self.id
    }

    /// Returns the owning job identifier.
    #[must_use]
    pub fn job_id(&self) -> &JobId {
        &self.job_id
    }

    /// Returns the current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> RunStatus {
        self.status
    }

    /// Returns the number of execution attempts so far.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Returns the recorded outcome, when one exists.
    #[must_use]
    pub const fn outcome(&self) -> Option<&RunOutcome> {
        self.outcome.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when execution began, when it has.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when the run was finalized, when it has been.
    #[must_use]
    pub const fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Admits the run: `Queued → Starting`.
    ///
    /// # Errors
    ///
    /// Returns [`RunDomainError::InvalidTransition`] when the run is not
    /// queued.
    pub fn begin_start(&mut self, clock: &impl Clock) -> Result<(), RunDomainError> {
        self.transition_to(RunStatus::Starting, clock)
    }

    /// Starts the job body: `Starting → Executing`; counts an attempt.
    ///
    /// # Errors
    ///
    /// Returns [`RunDomainError::InvalidTransition`] when the run is not
    /// starting.
    pub fn begin_execution(&mut self, clock: &impl Clock) -> Result<(), RunDomainError> {
        self.transition_to(RunStatus::Executing, clock)?;
        self.attempt = self.attempt.saturating_add(1);
        self.started_at = Some(self.updated_at);
        Ok(())
    }

    /// Records the job body outcome on an executing run.
    ///
    /// # Errors
    ///
    /// Returns [`RunDomainError::InvalidTransition`] when the run is not
    /// executing.
    pub fn record_outcome(
        &mut self,
        outcome: RunOutcome,
        clock: &impl Clock,
    ) -> Result<(), RunDomainError> {
        if self.status != RunStatus::Executing {
            return Err(RunDomainError::InvalidTransition {
                from: self.status,
                to: self.status,
            });
        }
        self.outcome = Some(outcome);
        self.touch(clock);
        Ok(())
    }

    /// Finalizes the run from its recorded outcome:
    /// `Executing → {Completed, Failed}`.
    ///
    /// # Errors
    ///
    /// Returns [`RunDomainError::MissingOutcome`] when no outcome has been
    /// recorded, or [`RunDomainError::InvalidTransition`] when the run is not
    /// executing.
    pub fn finalize(&mut self, clock: &impl Clock) -> Result<RunStatus, RunDomainError> {
        let target = match &self.outcome {
            Some(RunOutcome::Success { .. }) => RunStatus::Completed,
            Some(RunOutcome::Failure { .. }) => RunStatus::Failed,
            None => return Err(RunDomainError::MissingOutcome(self.id.to_string())),
        };
        self.transition_to(target, clock)?;
        self.finished_at = Some(self.updated_at);
        Ok(target)
    }

    /// Reconstructs a persisted run aggregate.
    #[must_use]
    pub fn from_persisted(data: PersistedRunData) -> Self {
        Self {
            id: data.id,
            job_id: data.job_id,
            status: data.status,
            attempt: data.attempt,
            outcome: data.outcome,
            created_at: data.created_at,
            started_at: data.started_at,
            finished_at: data.finished_at,
            updated_at: data.updated_at,
        }
    }

    fn transition_to(
        &mut self,
        next: RunStatus,
        clock: &impl Clock,
    ) -> Result<(), RunDomainError> {
        if !self.status.can_transition_to(next) {
            return Err(RunDomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch(clock);
        Ok(())
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}

/// Parameter object for reconstructing a persisted run aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedRunData {
    /// Persisted run identifier.
    pub id: RunId,
    /// Persisted owning job identifier.
    pub job_id: JobId,
    /// Persisted lifecycle status.
    pub status: RunStatus,
    /// Persisted attempt counter.
    pub attempt: u32,
    /// Persisted outcome, when one was recorded.
    pub outcome: Option<RunOutcome>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted execution start timestamp.
    pub started_at: Option<DateTime<Utc>>,
    /// Persisted finalization timestamp.
    pub finished_at: Option<DateTime<Utc>>,
    /// Persisted last update timestamp.
    pub updated_at: DateTime<Utc>,
}
