//! Unit tests for the task catalog, routing rules, and payload validation.

use crate::queue::domain::{
    DEFAULT_MAX_ATTEMPTS, EVENT_DISPATCHER_QUEUE, EXECUTIONS_QUEUE, INTERNAL_QUEUE, QueueName,
    QueueRouting, TaskCatalog, TaskDefinition, TaskInstanceId, TaskKind, TaskPayload,
};
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(TaskKind::StartRun, 13)]
#[case(TaskKind::PerformRunExecution, 1)]
#[case(TaskKind::PerformTaskOperation, 3)]
#[case(TaskKind::StartQueuedRuns, 3)]
#[case(TaskKind::RunFinished, 3)]
#[case(TaskKind::DeliverEvent, 3)]
#[case(TaskKind::InvokeDispatcher, 3)]
#[case(TaskKind::DeliverScheduled, 5)]
#[case(TaskKind::DeliverHttpSourceRequest, 5)]
#[case(TaskKind::ScheduleEmail, 3)]
#[case(TaskKind::OrganizationCreated, 3)]
fn builtin_attempt_ceilings_match_the_catalog(#[case] kind: TaskKind, #[case] expected: u32) {
    assert_eq!(TaskDefinition::builtin(kind).max_attempts(), expected);
}

#[rstest]
#[case(TaskKind::ScheduleEmail, 100)]
#[case(TaskKind::OrganizationCreated, 50)]
#[case(TaskKind::StartInitialProjectDeployment, 50)]
#[case(TaskKind::IndexEndpoint, 0)]
#[case(TaskKind::StartRun, 0)]
fn builtin_priorities_match_the_catalog(#[case] kind: TaskKind, #[case] expected: i32) {
    assert_eq!(TaskDefinition::builtin(kind).priority(), expected);
}

#[rstest]
#[case(TaskKind::ScheduleEmail, INTERNAL_QUEUE)]
#[case(TaskKind::OrganizationCreated, INTERNAL_QUEUE)]
#[case(TaskKind::IndexEndpoint, INTERNAL_QUEUE)]
#[case(TaskKind::StartInitialProjectDeployment, INTERNAL_QUEUE)]
#[case(TaskKind::StartRun, EXECUTIONS_QUEUE)]
#[case(TaskKind::DeliverEvent, EVENT_DISPATCHER_QUEUE)]
fn constant_routed_kinds_share_their_named_queue(#[case] kind: TaskKind, #[case] queue: &str) {
    assert_eq!(
        *TaskDefinition::builtin(kind).routing(),
        QueueRouting::Constant(QueueName::from(queue))
    );
}

#[rstest]
fn per_resource_routing_derives_queue_from_payload() {
    let catalog = TaskCatalog::builtin();
    let resolved = catalog
        .resolve(TaskKind::PerformRunExecution, &json!({"id": "run_123"}))
        .expect("payload should validate");
    let queue = resolved
        .definition
        .routing()
        .queue_for(&resolved.payload, TaskInstanceId::new())
        .expect("run payloads carry a resource key");

    assert_eq!(queue, QueueName::from("runs:run_123"));
}

#[rstest]
#[case(TaskKind::PerformTaskOperation, json!({"id": "task_9"}), "tasks:task_9")]
#[case(TaskKind::StartQueuedRuns, json!({"id": "job_7"}), "queue:job_7")]
fn per_resource_prefixes_match_the_catalog(
    #[case] kind: TaskKind,
    #[case] payload: serde_json::Value,
    #[case] expected: &str,
) {
    let catalog = TaskCatalog::builtin();
    let resolved = catalog.resolve(kind, &payload).expect("payload should validate");
    let queue = resolved
        .definition
        .routing()
        .queue_for(&resolved.payload, TaskInstanceId::new())
        .expect("payload carries a resource key");

    assert_eq!(queue, QueueName::from(expected));
}

#[rstest]
fn anonymous_routing_gives_each_instance_its_own_queue() {
    let routing = QueueRouting::Anonymous;
    let payload = TaskKind::RegisterSource
        .parse_payload(&json!({
            "endpoint_id": "ep_1",
            "source": {"key": "stripe.charges", "channel": {"type": "http", "url": "https://example.com/hook"}}
        }))
        .expect("payload should validate");

    let first = routing
        .queue_for(&payload, TaskInstanceId::new())
        .expect("anonymous routing always resolves");
    let second = routing
        .queue_for(&payload, TaskInstanceId::new())
        .expect("anonymous routing always resolves");

    assert_ne!(first, second);
    assert!(first.as_str().starts_with("instance:"));
}

#[rstest]
fn resolve_rejects_payload_violating_the_schema() {
    let catalog = TaskCatalog::builtin();

    let result = catalog.resolve(TaskKind::StartRun, &json!({"run": "run_123"}));

    assert!(result.is_err());
}

#[rstest]
fn resolve_defaults_missing_optional_fields() {
    let catalog = TaskCatalog::builtin();

    let resolved = catalog
        .resolve(TaskKind::ActivateSource, &json!({"id": "src_1"}))
        .expect("orphaned_events should default to empty");

    let TaskPayload::ActivateSource(payload) = resolved.payload else {
        panic!("resolved payload should match the requested kind");
    };
    assert!(payload.orphaned_events.is_empty());
}

#[rstest]
fn catalog_override_replaces_only_the_overridden_kind() {
    let definition = TaskDefinition::new(TaskKind::ScheduleEmail)
        .with_priority(5)
        .with_max_attempts(7)
        .expect("non-zero ceiling is valid");
    let catalog = TaskCatalog::builtin().with_definition(definition.clone());

    assert_eq!(catalog.definition(TaskKind::ScheduleEmail), definition);
    assert_eq!(
        catalog.definition(TaskKind::StartRun),
        TaskDefinition::builtin(TaskKind::StartRun)
    );
}

#[rstest]
fn zero_attempt_ceiling_is_rejected() {
    let result = TaskDefinition::new(TaskKind::ScheduleEmail).with_max_attempts(0);

    assert!(result.is_err());
}

#[rstest]
fn default_ceiling_is_three() {
    assert_eq!(DEFAULT_MAX_ATTEMPTS, 3);
    assert_eq!(
        TaskDefinition::new(TaskKind::RunFinished).max_attempts(),
        DEFAULT_MAX_ATTEMPTS
    );
}

#[rstest]
#[case(TaskKind::InvokeDispatcher, "events.invokeDispatcher")]
#[case(TaskKind::DeliverScheduled, "events.deliverScheduled")]
#[case(TaskKind::StartRun, "startRun")]
#[case(TaskKind::PerformRunExecution, "performRunExecution")]
#[case(TaskKind::DeliverHttpSourceRequest, "deliverHttpSourceRequest")]
fn kind_wire_names_round_trip(#[case] kind: TaskKind, #[case] name: &str) {
    assert_eq!(kind.as_str(), name);
    assert_eq!(TaskKind::try_from(name), Ok(kind));
}

#[rstest]
fn every_kind_appears_exactly_once_in_all() {
    let mut names: Vec<&str> = TaskKind::ALL.iter().map(|kind| kind.as_str()).collect();
    names.sort_unstable();
    names.dedup();

    assert_eq!(names.len(), TaskKind::ALL.len());
}
