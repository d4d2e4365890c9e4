//! Task handler binding the run lifecycle to the queue.

use crate::queue::domain::{TaskKind, TaskPayload};
use crate::queue::ports::{HandlerError, HandlerResult, TaskHandler};
use crate::run::ports::{JobSettings, RunExecutor, RunRepository};
use crate::run::services::RunLifecycleService;
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;

/// Dispatches the four run lifecycle task kinds onto the lifecycle service.
///
/// One instance is registered under each of `startRun`,
/// `performRunExecution`, `runFinished`, and `startQueuedRuns`.
pub struct RunTaskHandler<R, J, E, C>
where
    R: RunRepository,
    J: JobSettings,
    E: RunExecutor,
    C: Clock + Send + Sync,
{
    service: Arc<RunLifecycleService<R, J, E, C>>,
}

impl<R, J, E, C> RunTaskHandler<R, J, E, C>
where
    R: RunRepository,
    J: JobSettings,
    E: RunExecutor,
    C: Clock + Send + Sync,
{
    /// Creates a handler over the lifecycle service.
    #[must_use]
    pub const fn new(service: Arc<RunLifecycleService<R, J, E, C>>) -> Self {
        Self { service }
    }

    /// Returns the task kinds this handler must be registered under.
    #[must_use]
    pub const fn kinds() -> [TaskKind; 4] {
        [
            TaskKind::StartRun,
            TaskKind::PerformRunExecution,
            TaskKind::RunFinished,
            TaskKind::StartQueuedRuns,
        ]
    }
}

#[async_trait]
impl<R, J, E, C> TaskHandler for RunTaskHandler<R, J, E, C>
where
    R: RunRepository + 'static,
    J: JobSettings + 'static,
    E: RunExecutor + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn handle(&self, payload: TaskPayload) -> HandlerResult<()> {
        match payload {
            TaskPayload::StartRun(payload) => self
                .service
                .start_run(&payload.id)
                .await
                .map_err(HandlerError::failed),
            TaskPayload::PerformRunExecution(payload) => self
                .service
                .perform_execution(&payload.id)
                .await
                .map_err(HandlerError::failed),
            TaskPayload::RunFinished(payload) => self
                .service
                .run_finished(&payload.id)
                .await
                .map_err(HandlerError::failed),
            TaskPayload::StartQueuedRuns(payload) => self
                .service
                .start_queued_runs(&payload.id)
                .await
                .map_err(HandlerError::failed),
            other => Err(HandlerError::UnexpectedPayload { kind: other.kind() }),
        }
    }
}
