//! Service orchestration tests for event fan-out and dispatcher invocation.

use crate::event::adapters::memory::{InMemoryDispatcherRepository, InMemoryEventRepository};
use crate::event::domain::{
    Dispatchable, Dispatcher, DispatcherId, EndpointId, EventId, JobRegistration,
    ScheduleMetadata, ScheduledPayload,
};
use crate::event::ports::{
    DispatcherRepository, EventRepository, RunStarter, RunStarterResult,
};
use crate::event::services::{EventDispatchError, EventDispatchService};
use crate::queue::domain::{TaskInstanceId, TaskKind, TaskPayload};
use crate::queue::ports::{EnqueueOptions, EnqueueResult, Enqueuer};
use crate::run::domain::{JobId, RunId};
use async_trait::async_trait;
use chrono::Utc;
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::json;
use std::sync::{Arc, Mutex};

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

    fn invoked_dispatchers(&self) -> Vec<DispatcherId> {
        self.payloads
            .lock()
            .expect("enqueuer lock")
            .iter()
            .filter_map(|payload| match payload {
                TaskPayload::InvokeDispatcher(invoke) => Some(invoke.id.clone()),
                _ => None,
            })
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

#[derive(Default)]
struct RecordingStarter {
    started: Mutex<Vec<JobId>>,
}

impl RecordingStarter {
    fn started_jobs(&self) -> Vec<JobId> {
        self.started.lock().expect("starter lock").clone()
    }
}

#[async_trait]
impl RunStarter for RecordingStarter {
    async fn create_run_for_job(&self, job_id: JobId) -> RunStarterResult<RunId> {
        self.started.lock().expect("starter lock").push(job_id);
        Ok(RunId::new("run_stub"))
    }
}

type TestService =
    EventDispatchService<InMemoryEventRepository, InMemoryDispatcherRepository, DefaultClock>;

struct Harness {
    events: Arc<InMemoryEventRepository>,
    dispatchers: Arc<InMemoryDispatcherRepository>,
    starter: Arc<RecordingStarter>,
    enqueuer: Arc<RecordingEnqueuer>,
    service: TestService,
}

fn harness() -> Harness {
    let events = Arc::new(InMemoryEventRepository::new());
    let dispatchers = Arc::new(InMemoryDispatcherRepository::new());
    let starter = Arc::new(RecordingStarter::default());
    let enqueuer = Arc::new(RecordingEnqueuer::default());
    let service = EventDispatchService::new(
        Arc::clone(&events),
        Arc::clone(&dispatchers),
        Arc::clone(&starter) as Arc<dyn RunStarter>,
        Arc::clone(&enqueuer) as Arc<dyn Enqueuer>,
        Arc::new(DefaultClock),
    );
    Harness {
        events,
        dispatchers,
        starter,
        enqueuer,
        service,
    }
}

fn trigger_dispatcher(id: &str, event_name: &str, jobs: &[&str]) -> Dispatcher {
    Dispatcher::new(
        DispatcherId::new(id),
        EndpointId::new("ep_1"),
        format!("slug-{id}"),
        Dispatchable::Trigger {
            event_name: event_name.to_owned(),
        },
        jobs.iter()
            .map(|job| JobRegistration {
                id: JobId::new(*job),
                version: "1.0.0".to_owned(),
            })
            .collect(),
        &DefaultClock,
    )
    .expect("valid dispatcher")
}

fn schedule_dispatcher(id: &str, jobs: &[&str]) -> Dispatcher {
    Dispatcher::new(
        DispatcherId::new(id),
        EndpointId::new("ep_1"),
        format!("slug-{id}"),
        Dispatchable::Schedule {
            schedule: ScheduleMetadata::interval(3600).expect("valid interval"),
        },
        jobs.iter()
            .map(|job| JobRegistration {
                id: JobId::new(*job),
                version: "1.0.0".to_owned(),
            })
            .collect(),
        &DefaultClock,
    )
    .expect("valid dispatcher")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn ingest_persists_record_and_enqueues_delivery() {
    let harness = harness();

    let event = harness
        .service
        .ingest("order.created", "api", json!({"order": 7}))
        .await
        .expect("ingestion should succeed");

    let stored = harness
        .events
        .find_by_id(event.id())
        .await
        .expect("lookup should succeed")
        .expect("event was persisted");
    assert!(stored.delivered_at().is_none());
    assert_eq!(harness.enqueuer.kinds(), vec![TaskKind::DeliverEvent]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deliver_event_fans_out_to_matching_dispatchers_only() {
    let harness = harness();
    harness
        .dispatchers
        .upsert(&trigger_dispatcher("disp_1", "order.created", &["job_a"]))
        .await
        .expect("upsert should succeed");
    harness
        .dispatchers
        .upsert(&trigger_dispatcher("disp_2", "order.created", &["job_b"]))
        .await
        .expect("upsert should succeed");
    harness
        .dispatchers
        .upsert(&trigger_dispatcher("disp_3", "user.created", &["job_c"]))
        .await
        .expect("upsert should succeed");
    harness
        .dispatchers
        .upsert(&schedule_dispatcher("disp_4", &["job_d"]))
        .await
        .expect("upsert should succeed");
    let event = harness
        .service
        .ingest("order.created", "api", json!({}))
        .await
        .expect("ingestion should succeed");

    harness
        .service
        .deliver_event(event.id())
        .await
        .expect("delivery should succeed");

    let invoked = harness.enqueuer.invoked_dispatchers();
    assert_eq!(
        invoked,
        vec![DispatcherId::new("disp_1"), DispatcherId::new("disp_2")]
    );
    let delivered = harness
        .events
        .find_by_id(event.id())
        .await
        .expect("lookup should succeed")
        .expect("event exists");
    assert!(delivered.delivered_at().is_some());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deliver_event_is_idempotent() {
    let harness = harness();
    harness
        .dispatchers
        .upsert(&trigger_dispatcher("disp_1", "order.created", &["job_a"]))
        .await
        .expect("upsert should succeed");
    let event = harness
        .service
        .ingest("order.created", "api", json!({}))
        .await
        .expect("ingestion should succeed");
    harness
        .service
        .deliver_event(event.id())
        .await
        .expect("delivery should succeed");
    let kinds_before = harness.enqueuer.kinds();

    harness
        .service
        .deliver_event(event.id())
        .await
        .expect("repeated delivery is a no-op");

    assert_eq!(harness.enqueuer.kinds(), kinds_before);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deliver_event_for_unknown_id_is_not_found() {
    let harness = harness();

    let result = harness.service.deliver_event(&EventId::new("evt_missing")).await;

    assert!(matches!(result, Err(EventDispatchError::EventNotFound(_))));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn invoke_dispatcher_starts_one_run_per_registered_job() {
    let harness = harness();
    harness
        .dispatchers
        .upsert(&trigger_dispatcher("disp_1", "order.created", &["job_a", "job_b"]))
        .await
        .expect("upsert should succeed");
    let event = harness
        .service
        .ingest("order.created", "api", json!({}))
        .await
        .expect("ingestion should succeed");

    harness
        .service
        .invoke_dispatcher(&DispatcherId::new("disp_1"), event.id())
        .await
        .expect("invocation should succeed");

    assert_eq!(
        harness.starter.started_jobs(),
        vec![JobId::new("job_a"), JobId::new("job_b")]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deliver_scheduled_rejects_trigger_dispatchers() {
    let harness = harness();
    harness
        .dispatchers
        .upsert(&trigger_dispatcher("disp_1", "order.created", &["job_a"]))
        .await
        .expect("upsert should succeed");

    let result = harness
        .service
        .deliver_scheduled(
            &DispatcherId::new("disp_1"),
            ScheduledPayload {
                ts: Utc::now(),
                last_timestamp: None,
            },
        )
        .await;

    assert!(matches!(result, Err(EventDispatchError::Domain(_))));
    assert!(harness.starter.started_jobs().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deliver_scheduled_synthesizes_event_and_starts_jobs() {
    let harness = harness();
    harness
        .dispatchers
        .upsert(&schedule_dispatcher("disp_1", &["job_a"]))
        .await
        .expect("upsert should succeed");
    let tick = ScheduledPayload {
        ts: Utc::now(),
        last_timestamp: None,
    };

    harness
        .service
        .deliver_scheduled(&DispatcherId::new("disp_1"), tick)
        .await
        .expect("scheduled delivery should succeed");

    assert_eq!(harness.starter.started_jobs(), vec![JobId::new("job_a")]);
}
