//! Tests for idempotent dynamic trigger, schedule, and source registration.

use crate::event::adapters::memory::{InMemoryDispatcherRepository, InMemorySourceRepository};
use crate::event::domain::{
    Dispatchable, DynamicScheduleMetadata, DynamicTriggerMetadata, EndpointId, EventDomainError,
    EventId, JobRegistration, ScheduleMetadata, SourceChannel, SourceId, SourceMetadata,
};
use crate::event::services::{RegistrationError, RegistrationService};
use crate::queue::domain::{TaskInstanceId, TaskKind, TaskPayload};
use crate::queue::ports::{EnqueueOptions, EnqueueResult, Enqueuer};
use crate::run::domain::JobId;
use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::rstest;
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

type TestService =
    RegistrationService<InMemoryDispatcherRepository, InMemorySourceRepository, DefaultClock>;

struct Harness {
    enqueuer: Arc<RecordingEnqueuer>,
    service: TestService,
}

fn harness() -> Harness {
    let dispatchers = Arc::new(InMemoryDispatcherRepository::new());
    let sources = Arc::new(InMemorySourceRepository::new());
    let enqueuer = Arc::new(RecordingEnqueuer::default());
    let service = RegistrationService::new(
        dispatchers,
        sources,
        Arc::clone(&enqueuer) as Arc<dyn Enqueuer>,
        Arc::new(DefaultClock),
    );
    Harness { enqueuer, service }
}

fn endpoint() -> EndpointId {
    EndpointId::new("ep_1")
}

fn jobs(names: &[&str]) -> Vec<JobRegistration> {
    names
        .iter()
        .map(|name| JobRegistration {
            id: JobId::new(*name),
            version: "1.0.0".to_owned(),
        })
        .collect()
}

fn trigger(slug: &str, event_name: &str, job_names: &[&str]) -> DynamicTriggerMetadata {
    DynamicTriggerMetadata {
        id: slug.to_owned(),
        event_name: event_name.to_owned(),
        jobs: jobs(job_names),
    }
}

fn http_source(key: &str, url: &str) -> SourceMetadata {
    SourceMetadata {
        key: key.to_owned(),
        channel: SourceChannel::Http {
            url: url.to_owned(),
        },
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registering_a_trigger_creates_a_dispatcher() {
    let harness = harness();

    let dispatcher = harness
        .service
        .register_dynamic_trigger(&endpoint(), trigger("on-order", "order.created", &["job_a"]))
        .await
        .expect("registration should succeed");

    assert_eq!(dispatcher.slug(), "on-order");
    assert!(dispatcher.matches_event("order.created"));
    assert_eq!(dispatcher.jobs().len(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn re_registering_a_trigger_keeps_its_identifier() {
    let harness = harness();
    let first = harness
        .service
        .register_dynamic_trigger(&endpoint(), trigger("on-order", "order.created", &["job_a"]))
        .await
        .expect("registration should succeed");

    let second = harness
        .service
        .register_dynamic_trigger(
            &endpoint(),
            trigger("on-order", "order.updated", &["job_a", "job_b"]),
        )
        .await
        .expect("re-registration should succeed");

    assert_eq!(second.id(), first.id());
    assert!(second.matches_event("order.updated"));
    assert!(!second.matches_event("order.created"));
    assert_eq!(second.jobs().len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn same_slug_on_another_endpoint_is_a_distinct_dispatcher() {
    let harness = harness();
    let first = harness
        .service
        .register_dynamic_trigger(&endpoint(), trigger("on-order", "order.created", &["job_a"]))
        .await
        .expect("registration should succeed");

    let other = harness
        .service
        .register_dynamic_trigger(
            &EndpointId::new("ep_2"),
            trigger("on-order", "order.created", &["job_a"]),
        )
        .await
        .expect("registration should succeed");

    assert_ne!(other.id(), first.id());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registering_a_schedule_creates_a_schedule_dispatcher() {
    let harness = harness();

    let dispatcher = harness
        .service
        .register_dynamic_schedule(
            &endpoint(),
            DynamicScheduleMetadata {
                id: "hourly".to_owned(),
                schedule: ScheduleMetadata::interval(3600).expect("valid interval"),
                jobs: jobs(&["job_a"]),
            },
        )
        .await
        .expect("registration should succeed");

    assert!(matches!(
        dispatcher.dispatchable(),
        Dispatchable::Schedule { .. }
    ));
    assert!(dispatcher.schedule().is_ok());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_slug_is_rejected() {
    let harness = harness();

    let result = harness
        .service
        .register_dynamic_trigger(&endpoint(), trigger("  ", "order.created", &["job_a"]))
        .await;

    assert!(matches!(
        result,
        Err(RegistrationError::Domain(EventDomainError::EmptyDispatcherSlug))
    ));
}

#[rstest]
#[case(59)]
#[case(86_401)]
fn out_of_range_intervals_are_rejected(#[case] seconds: u32) {
    assert_eq!(
        ScheduleMetadata::interval(seconds),
        Err(EventDomainError::IntervalOutOfRange(seconds))
    );
}

#[rstest]
#[case(60)]
#[case(86_400)]
fn boundary_intervals_are_accepted(#[case] seconds: u32) {
    assert_eq!(
        ScheduleMetadata::interval(seconds),
        Ok(ScheduleMetadata::Interval { seconds })
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registered_sources_start_inactive() {
    let harness = harness();

    let source = harness
        .service
        .register_source(&endpoint(), http_source("github.webhook", "https://hook.test/1"))
        .await
        .expect("registration should succeed");

    assert!(!source.is_active());
    assert_eq!(source.key(), "github.webhook");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn re_registering_a_source_keeps_its_identifier_and_updates_the_channel() {
    let harness = harness();
    let first = harness
        .service
        .register_source(&endpoint(), http_source("github.webhook", "https://hook.test/1"))
        .await
        .expect("registration should succeed");

    let second = harness
        .service
        .register_source(&endpoint(), http_source("github.webhook", "https://hook.test/2"))
        .await
        .expect("re-registration should succeed");

    assert_eq!(second.id(), first.id());
    assert_eq!(
        second.channel(),
        &SourceChannel::Http {
            url: "https://hook.test/2".to_owned(),
        }
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn activation_redelivers_orphaned_events() {
    let harness = harness();
    let source = harness
        .service
        .register_source(&endpoint(), http_source("github.webhook", "https://hook.test/1"))
        .await
        .expect("registration should succeed");
    let orphaned = vec![EventId::new("evt_1"), EventId::new("evt_2")];

    let activated = harness
        .service
        .activate_source(source.id(), orphaned)
        .await
        .expect("activation should succeed");

    assert!(activated.is_active());
    assert_eq!(
        harness.enqueuer.kinds(),
        vec![TaskKind::DeliverEvent, TaskKind::DeliverEvent]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn activating_an_unknown_source_is_not_found() {
    let harness = harness();

    let result = harness
        .service
        .activate_source(&SourceId::new("src_missing"), Vec::new())
        .await;

    assert!(matches!(result, Err(RegistrationError::SourceNotFound(_))));
}
