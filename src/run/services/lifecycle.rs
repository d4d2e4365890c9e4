//! Service layer driving the run lifecycle.
//!
//! Every lifecycle step is the body of a queue task: `startRun` admits,
//! `performRunExecution` executes, `runFinished` finalizes, and
//! `startQueuedRuns` promotes deferred runs once capacity frees up. The
//! service never advances a run outside those task bodies.

use crate::event::ports::{RunStarter, RunStarterError, RunStarterResult};
use crate::queue::domain::{
    PerformRunExecutionPayload, RunFinishedPayload, StartQueuedRunsPayload, StartRunPayload,
    TaskPayload,
};
use crate::queue::ports::{EnqueueError, EnqueueOptions, Enqueuer};
use crate::run::domain::{JobId, Run, RunDomainError, RunId, RunStatus};
use crate::run::ports::{
    JobSettings, JobSettingsError, RunExecutor, RunExecutorError, RunObserver, RunRepository,
    RunRepositoryError,
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Service-level errors for run lifecycle operations.
#[derive(Debug, Error)]
pub enum RunLifecycleError {
    /// The run was not found.
    #[error("run not found: {0}")]
    NotFound(RunId),
    /// Domain state machine rejected the transition.
    #[error(transparent)]
    Domain(#[from] RunDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] RunRepositoryError),
    /// Settings lookup failed.
    #[error(transparent)]
    Settings(#[from] JobSettingsError),
    /// The job body could not be invoked.
    #[error(transparent)]
    Executor(#[from] RunExecutorError),
    /// Enqueueing a follow-up task failed.
    #[error(transparent)]
    Enqueue(#[from] EnqueueError),
}

/// Result type for run lifecycle service operations.
pub type RunLifecycleResult<T> = Result<T, RunLifecycleError>;

/// Run lifecycle orchestration service.
pub struct RunLifecycleService<R, J, E, C>
where
    R: RunRepository,
    J: JobSettings,
    E: RunExecutor,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    settings: Arc<J>,
    executor: Arc<E>,
    enqueuer: Arc<dyn Enqueuer>,
    observer: Arc<dyn RunObserver>,
    clock: Arc<C>,
}

impl<R, J, E, C> RunLifecycleService<R, J, E, C>
where
    R: RunRepository,
    J: JobSettings,
    E: RunExecutor,
    C: Clock + Send + Sync,
{
    /// Creates a new run lifecycle service.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        settings: Arc<J>,
        executor: Arc<E>,
        enqueuer: Arc<dyn Enqueuer>,
        observer: Arc<dyn RunObserver>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            repository,
            settings,
            executor,
            enqueuer,
            observer,
            clock,
        }
    }

    /// Creates a queued run for `job_id` and enqueues its admission task.
    ///
    /// # Errors
    ///
    /// Returns [`RunLifecycleError`] when persistence or enqueueing fails.
    pub async fn create_run(&self, job_id: JobId) -> RunLifecycleResult<Run> {
        let run_id = RunId::new(format!("run_{}", Uuid::new_v4().simple()));
        let run = Run::new(run_id.clone(), job_id, &*self.clock);
        self.repository.store(&run).await?;
        self.enqueuer
            .enqueue(
                TaskPayload::StartRun(StartRunPayload { id: run_id }),
                EnqueueOptions::new(),
            )
            .await?;
        info!(run = %run.id(), job = %run.job_id(), "run created");
        Ok(run)
    }

    /// Admits a queued run, deferring when the job is at its concurrency
    /// ceiling.
    ///
    /// Admission is idempotent: a run already past `Queued` is left alone,
    /// so a retried admission task cannot double-admit.
    ///
    /// # Errors
    ///
    /// Returns [`RunLifecycleError::NotFound`] when the run does not exist,
    /// or when persistence or enqueueing fails.
    pub async fn start_run(&self, id: &RunId) -> RunLifecycleResult<()> {
        let run = self.load(id).await?;
        if run.status() != RunStatus::Queued {
            debug!(run = %id, status = %run.status(), "run already admitted, nothing to do");
            return Ok(());
        }
        if self.at_capacity(run.job_id()).await? {
            info!(run = %id, job = %run.job_id(), "job at concurrency ceiling, run deferred");
            return Ok(());
        }
        self.admit_queued(run).await
    }

    /// Executes the job body for an admitted run and records its outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RunLifecycleError::Executor`] when the body could not be
    /// invoked, [`RunLifecycleError::Domain`] when the run is not in the
    /// `Starting` status, or when persistence or enqueueing fails.
    pub async fn perform_execution(&self, id: &RunId) -> RunLifecycleResult<()> {
        let mut run = self.load(id).await?;
        run.begin_execution(&*self.clock)?;
        self.repository.update(&run).await?;

        let outcome = self.executor.execute(&run).await?;
        run.record_outcome(outcome, &*self.clock)?;
        self.repository.update(&run).await?;

        self.enqueuer
            .enqueue(
                TaskPayload::RunFinished(RunFinishedPayload { id: id.clone() }),
                EnqueueOptions::new(),
            )
            .await?;
        Ok(())
    }

    /// Finalizes an executed run, notifies the observer, and triggers
    /// promotion of queued runs for the same job.
    ///
    /// # Errors
    ///
    /// Returns [`RunLifecycleError::Domain`] when no outcome was recorded or
    /// the run is not executing, or when persistence or enqueueing fails.
    pub async fn run_finished(&self, id: &RunId) -> RunLifecycleResult<()> {
        let mut run = self.load(id).await?;
        let status = run.finalize(&*self.clock)?;
        self.repository.update(&run).await?;
        self.observer.run_finished(&run).await;
        info!(run = %id, job = %run.job_id(), status = %status, "run finished");

        self.enqueuer
            .enqueue(
                TaskPayload::StartQueuedRuns(StartQueuedRunsPayload {
                    id: run.job_id().clone(),
                }),
                EnqueueOptions::new(),
            )
            .await?;
        Ok(())
    }

    /// Promotes the oldest queued runs of a job up to its free capacity.
    ///
    /// # Errors
    ///
    /// Returns [`RunLifecycleError`] when lookups, persistence, or
    /// enqueueing fail.
    pub async fn start_queued_runs(&self, job_id: &JobId) -> RunLifecycleResult<()> {
        let capacity = match self.settings.concurrency_limit(job_id).await? {
            Some(limit) => {
                let active = self.repository.count_active(job_id).await?;
                usize::try_from(limit).unwrap_or(usize::MAX).saturating_sub(active)
            }
            None => usize::MAX,
        };
        if capacity == 0 {
            return Ok(());
        }
        let queued = self.repository.oldest_queued(job_id, capacity).await?;
        for run in queued {
            self.admit_queued(run).await?;
        }
        Ok(())
    }

    async fn load(&self, id: &RunId) -> RunLifecycleResult<Run> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| RunLifecycleError::NotFound(id.clone()))
    }

    async fn at_capacity(&self, job_id: &JobId) -> RunLifecycleResult<bool> {
        let Some(limit) = self.settings.concurrency_limit(job_id).await? else {
            return Ok(false);
        };
        let active = self.repository.count_active(job_id).await?;
        Ok(active >= usize::try_from(limit).unwrap_or(usize::MAX))
    }

    async fn admit_queued(&self, mut run: Run) -> RunLifecycleResult<()> {
        run.begin_start(&*self.clock)?;
        self.repository.update(&run).await?;
        self.enqueuer
            .enqueue(
                TaskPayload::PerformRunExecution(PerformRunExecutionPayload {
                    id: run.id().clone(),
                }),
                EnqueueOptions::new(),
            )
            .await?;
        info!(run = %run.id(), job = %run.job_id(), "run admitted");
        Ok(())
    }
}

#[async_trait::async_trait]
impl<R, J, E, C> RunStarter for RunLifecycleService<R, J, E, C>
where
    R: RunRepository + 'static,
    J: JobSettings + 'static,
    E: RunExecutor + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn create_run_for_job(&self, job_id: JobId) -> RunStarterResult<RunId> {
        let run = self
            .create_run(job_id)
            .await
            .map_err(RunStarterError::failed)?;
        Ok(run.id().clone())
    }
}
