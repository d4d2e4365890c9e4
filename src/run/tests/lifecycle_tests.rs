//! Service orchestration tests for the run lifecycle.

use crate::queue::domain::{TaskInstanceId, TaskKind, TaskPayload};
use crate::queue::ports::{EnqueueOptions, EnqueueResult, Enqueuer};
use crate::run::adapters::memory::{InMemoryJobSettings, InMemoryRunRepository};
use crate::run::domain::{JobId, Run, RunOutcome, RunStatus};
use crate::run::ports::{
    NullRunObserver, RunExecutor, RunExecutorError, RunExecutorResult, RunRepository,
};
use crate::run::services::{RunLifecycleError, RunLifecycleService};
use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::json;
use std::sync::{Arc, Mutex};

/// Enqueuer fake that records every published payload.
#[derive(Default)]
struct RecordingEnqueuer {
    payloads: Mutex<Vec<TaskPayload>>,
}

impl RecordingEnqueuer {
    fn kinds(&self) -> Vec<TaskKind> {
        self.payloads
            .lock()
            .expect("enqueuer lock")
            .iter()
            .map(TaskPayload::kind)
            .collect()
    }
}

#[async_trait]
impl Enqueuer for RecordingEnqueuer {
    async fn enqueue(
        &self,
        payload: TaskPayload,
        _options: EnqueueOptions,
    ) -> EnqueueResult<TaskInstanceId> {
        self.payloads.lock().expect("enqueuer lock").push(payload);
        Ok(TaskInstanceId::new())
    }
}

/// Executor fake returning a preconfigured result.
struct StubExecutor {
    result: RunExecutorResult<RunOutcome>,
}

impl StubExecutor {
    fn succeeding() -> Self {
        Self {
            result: Ok(RunOutcome::Success {
                output: Some(json!({"done": true})),
            }),
        }
    }

    fn reporting_failure(message: &str) -> Self {
        Self {
            result: Ok(RunOutcome::Failure {
                error: message.to_owned(),
            }),
        }
    }

    fn unreachable_endpoint() -> Self {
        Self {
            result: Err(RunExecutorError::UnknownJob("job_1".to_owned())),
        }
    }
}

#[async_trait]
impl RunExecutor for StubExecutor {
    async fn execute(&self, _run: &Run) -> RunExecutorResult<RunOutcome> {
        self.result.clone()
    }
}

type TestService =
    RunLifecycleService<InMemoryRunRepository, InMemoryJobSettings, StubExecutor, DefaultClock>;

struct Harness {
    repository: Arc<InMemoryRunRepository>,
    enqueuer: Arc<RecordingEnqueuer>,
    service: TestService,
}

fn harness_with(settings: InMemoryJobSettings, executor: StubExecutor) -> Harness {
    let repository = Arc::new(InMemoryRunRepository::new());
    let enqueuer = Arc::new(RecordingEnqueuer::default());
    let service = RunLifecycleService::new(
        Arc::clone(&repository),
        Arc::new(settings),
        Arc::new(executor),
        Arc::clone(&enqueuer) as Arc<dyn Enqueuer>,
        Arc::new(NullRunObserver),
        Arc::new(DefaultClock),
    );
    Harness {
        repository,
        enqueuer,
        service,
    }
}

fn unlimited_harness() -> Harness {
    harness_with(InMemoryJobSettings::new(), StubExecutor::succeeding())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_run_persists_queued_and_enqueues_admission() {
    let harness = unlimited_harness();

    let run = harness
        .service
        .create_run(JobId::new("job_1"))
        .await
        .expect("run creation should succeed");

    let stored = harness
        .repository
        .find_by_id(run.id())
        .await
        .expect("lookup should succeed")
        .expect("run was persisted");
    assert_eq!(stored.status(), RunStatus::Queued);
    assert_eq!(harness.enqueuer.kinds(), vec![TaskKind::StartRun]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_run_admits_under_capacity() {
    let harness = unlimited_harness();
    let run = harness
        .service
        .create_run(JobId::new("job_1"))
        .await
        .expect("run creation should succeed");

    harness
        .service
        .start_run(run.id())
        .await
        .expect("admission should succeed");

    let stored = harness
        .repository
        .find_by_id(run.id())
        .await
        .expect("lookup should succeed")
        .expect("run exists");
    assert_eq!(stored.status(), RunStatus::Starting);
    assert_eq!(
        harness.enqueuer.kinds(),
        vec![TaskKind::StartRun, TaskKind::PerformRunExecution]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_run_defers_at_the_concurrency_ceiling() {
    let harness = harness_with(
        InMemoryJobSettings::new().with_limit(JobId::new("job_1"), 1),
        StubExecutor::succeeding(),
    );
    let first = harness
        .service
        .create_run(JobId::new("job_1"))
        .await
        .expect("run creation should succeed");
    let second = harness
        .service
        .create_run(JobId::new("job_1"))
        .await
        .expect("run creation should succeed");

    harness
        .service
        .start_run(first.id())
        .await
        .expect("first admission should succeed");
    harness
        .service
        .start_run(second.id())
        .await
        .expect("deferred admission is not an error");

    let deferred = harness
        .repository
        .find_by_id(second.id())
        .await
        .expect("lookup should succeed")
        .expect("run exists");
    assert_eq!(deferred.status(), RunStatus::Queued);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_run_is_idempotent_once_admitted() {
    let harness = unlimited_harness();
    let run = harness
        .service
        .create_run(JobId::new("job_1"))
        .await
        .expect("run creation should succeed");
    harness
        .service
        .start_run(run.id())
        .await
        .expect("admission should succeed");
    let kinds_before = harness.enqueuer.kinds();

    harness
        .service
        .start_run(run.id())
        .await
        .expect("repeated admission is a no-op");

    assert_eq!(harness.enqueuer.kinds(), kinds_before);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn perform_execution_records_success_and_chains_finalization() {
    let harness = unlimited_harness();
    let run = harness
        .service
        .create_run(JobId::new("job_1"))
        .await
        .expect("run creation should succeed");
    harness
        .service
        .start_run(run.id())
        .await
        .expect("admission should succeed");

    harness
        .service
        .perform_execution(run.id())
        .await
        .expect("execution should succeed");

    let stored = harness
        .repository
        .find_by_id(run.id())
        .await
        .expect("lookup should succeed")
        .expect("run exists");
    assert_eq!(stored.status(), RunStatus::Executing);
    assert_eq!(stored.attempt(), 1);
    assert!(matches!(
        stored.outcome(),
        Some(RunOutcome::Success { .. })
    ));
    assert!(harness.enqueuer.kinds().contains(&TaskKind::RunFinished));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn executor_transport_error_leaves_run_executing_without_outcome() {
    let harness = harness_with(InMemoryJobSettings::new(), StubExecutor::unreachable_endpoint());
    let run = harness
        .service
        .create_run(JobId::new("job_1"))
        .await
        .expect("run creation should succeed");
    harness
        .service
        .start_run(run.id())
        .await
        .expect("admission should succeed");

    let result = harness.service.perform_execution(run.id()).await;

    assert!(matches!(result, Err(RunLifecycleError::Executor(_))));
    let stored = harness
        .repository
        .find_by_id(run.id())
        .await
        .expect("lookup should succeed")
        .expect("run exists");
    assert_eq!(stored.status(), RunStatus::Executing);
    assert!(stored.outcome().is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn run_finished_finalizes_and_promotes_the_job_queue() {
    let harness = unlimited_harness();
    let run = harness
        .service
        .create_run(JobId::new("job_1"))
        .await
        .expect("run creation should succeed");
    harness
        .service
        .start_run(run.id())
        .await
        .expect("admission should succeed");
    harness
        .service
        .perform_execution(run.id())
        .await
        .expect("execution should succeed");

    harness
        .service
        .run_finished(run.id())
        .await
        .expect("finalization should succeed");

    let stored = harness
        .repository
        .find_by_id(run.id())
        .await
        .expect("lookup should succeed")
        .expect("run exists");
    assert_eq!(stored.status(), RunStatus::Completed);
    assert!(harness.enqueuer.kinds().contains(&TaskKind::StartQueuedRuns));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failure_outcome_finalizes_to_failed() {
    let harness = harness_with(
        InMemoryJobSettings::new(),
        StubExecutor::reporting_failure("endpoint returned 500"),
    );
    let run = harness
        .service
        .create_run(JobId::new("job_1"))
        .await
        .expect("run creation should succeed");
    harness
        .service
        .start_run(run.id())
        .await
        .expect("admission should succeed");
    harness
        .service
        .perform_execution(run.id())
        .await
        .expect("execution should succeed");

    harness
        .service
        .run_finished(run.id())
        .await
        .expect("finalization should succeed");

    let stored = harness
        .repository
        .find_by_id(run.id())
        .await
        .expect("lookup should succeed")
        .expect("run exists");
    assert_eq!(stored.status(), RunStatus::Failed);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn start_queued_runs_promotes_oldest_up_to_capacity() {
    let job = JobId::new("job_1");
    let harness = harness_with(
        InMemoryJobSettings::new().with_limit(job.clone(), 2),
        StubExecutor::succeeding(),
    );
    let mut runs = Vec::new();
    for _ in 0..4 {
        runs.push(
            harness
                .service
                .create_run(job.clone())
                .await
                .expect("run creation should succeed"),
        );
    }

    harness
        .service
        .start_queued_runs(&job)
        .await
        .expect("promotion should succeed");

    let mut statuses = Vec::new();
    for run in &runs {
        let stored = harness
            .repository
            .find_by_id(run.id())
            .await
            .expect("lookup should succeed")
            .expect("run exists");
        statuses.push(stored.status());
    }
    assert_eq!(
        statuses,
        vec![
            RunStatus::Starting,
            RunStatus::Starting,
            RunStatus::Queued,
            RunStatus::Queued,
        ]
    );
}
