//! The closed set of task kinds and their typed payloads.
//!
//! The catalog is a tagged-variant registry: every kind the system can
//! enqueue is a [`TaskKind`] variant bound to exactly one payload type, so a
//! payload is validated by deserializing it against the kind's type and a
//! missing handler is caught by the registry completeness check rather than
//! at dispatch time.

use super::{ParseTaskKindError, ValidationError};
use crate::event::domain::{
    DispatcherId, DynamicScheduleMetadata, DynamicTriggerMetadata, EndpointId, EventId,
    ScheduledPayload, SourceId, SourceMetadata,
};
use crate::run::domain::{JobId, RunId, TaskOperationId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A named category of unit of work with a fixed payload schema and
/// execution policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskKind {
    /// Housekeeping hook fired when an organization is created.
    OrganizationCreated,
    /// Re-indexes a deployed endpoint's registered jobs and sources.
    IndexEndpoint,
    /// Sends a transactional e-mail through the embedding application.
    ScheduleEmail,
    /// Provisions the first deployment of a freshly created project.
    StartInitialProjectDeployment,
    /// Admission-controls a queued run and enqueues its execution.
    StartRun,
    /// Executes the job body of one run.
    PerformRunExecution,
    /// Performs one task operation inside a run.
    PerformTaskOperation,
    /// Finalizes a run from its recorded outcome.
    RunFinished,
    /// Delivers a captured HTTP request to its ingestion source.
    DeliverHttpSourceRequest,
    /// Upserts an ingestion source registration.
    RegisterSource,
    /// Upserts a dynamic trigger registration.
    RegisterDynamicTrigger,
    /// Upserts a dynamic schedule registration.
    RegisterDynamicSchedule,
    /// Activates a registered source and re-delivers orphaned events.
    ActivateSource,
    /// Promotes queued runs of a job once capacity frees up.
    StartQueuedRuns,
    /// Fans an ingested event out to its matching dispatchers.
    DeliverEvent,
    /// Starts the runs registered against one dispatcher for one event.
    #[serde(rename = "events.invokeDispatcher")]
    InvokeDispatcher,
    /// Delivers a schedule tick to its dispatcher.
    #[serde(rename = "events.deliverScheduled")]
    DeliverScheduled,
}

impl TaskKind {
    /// Every kind in the catalog, used by the registry completeness check.
    pub const ALL: [Self; 17] = [
        Self::OrganizationCreated,
        Self::IndexEndpoint,
        Self::ScheduleEmail,
        Self::StartInitialProjectDeployment,
        Self::StartRun,
        Self::PerformRunExecution,
        Self::PerformTaskOperation,
        Self::RunFinished,
        Self::DeliverHttpSourceRequest,
        Self::RegisterSource,
        Self::RegisterDynamicTrigger,
        Self::RegisterDynamicSchedule,
        Self::ActivateSource,
        Self::StartQueuedRuns,
        Self::DeliverEvent,
        Self::InvokeDispatcher,
        Self::DeliverScheduled,
    ];

    /// Returns the canonical wire and storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OrganizationCreated => "organizationCreated",
            Self::IndexEndpoint => "indexEndpoint",
            Self::ScheduleEmail => "scheduleEmail",
            Self::StartInitialProjectDeployment => "startInitialProjectDeployment",
            Self::StartRun => "startRun",
            Self::PerformRunExecution => "performRunExecution",
            Self::PerformTaskOperation => "performTaskOperation",
            Self::RunFinished => "runFinished",
            Self::DeliverHttpSourceRequest => "deliverHttpSourceRequest",
            Self::RegisterSource => "registerSource",
            Self::RegisterDynamicTrigger => "registerDynamicTrigger",
            Self::RegisterDynamicSchedule => "registerDynamicSchedule",
            Self::ActivateSource => "activateSource",
            Self::StartQueuedRuns => "startQueuedRuns",
            Self::DeliverEvent => "deliverEvent",
            Self::InvokeDispatcher => "events.invokeDispatcher",
            Self::DeliverScheduled => "events.deliverScheduled",
        }
    }

    /// Validates a JSON payload against the kind's schema.
    ///
    /// This runs at publish time; a payload that fails here is never
    /// persisted.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the value does not deserialize into
    /// the kind's payload type.
    pub fn parse_payload(self, value: &Value) -> Result<TaskPayload, ValidationError> {
        let parsed = match self {
            Self::OrganizationCreated => {
                serde_json::from_value(value.clone()).map(TaskPayload::OrganizationCreated)
            }
            Self::IndexEndpoint => {
                serde_json::from_value(value.clone()).map(TaskPayload::IndexEndpoint)
            }
            Self::ScheduleEmail => {
                serde_json::from_value(value.clone()).map(TaskPayload::ScheduleEmail)
            }
            Self::StartInitialProjectDeployment => serde_json::from_value(value.clone())
                .map(TaskPayload::StartInitialProjectDeployment),
            Self::StartRun => serde_json::from_value(value.clone()).map(TaskPayload::StartRun),
            Self::PerformRunExecution => {
                serde_json::from_value(value.clone()).map(TaskPayload::PerformRunExecution)
            }
            Self::PerformTaskOperation => {
                serde_json::from_value(value.clone()).map(TaskPayload::PerformTaskOperation)
            }
            Self::RunFinished => {
                serde_json::from_value(value.clone()).map(TaskPayload::RunFinished)
            }
            Self::DeliverHttpSourceRequest => {
                serde_json::from_value(value.clone()).map(TaskPayload::DeliverHttpSourceRequest)
            }
            Self::RegisterSource => {
                serde_json::from_value(value.clone()).map(TaskPayload::RegisterSource)
            }
            Self::RegisterDynamicTrigger => {
                serde_json::from_value(value.clone()).map(TaskPayload::RegisterDynamicTrigger)
            }
            Self::RegisterDynamicSchedule => {
                serde_json::from_value(value.clone()).map(TaskPayload::RegisterDynamicSchedule)
            }
            Self::ActivateSource => {
                serde_json::from_value(value.clone()).map(TaskPayload::ActivateSource)
            }
            Self::StartQueuedRuns => {
                serde_json::from_value(value.clone()).map(TaskPayload::StartQueuedRuns)
            }
            Self::DeliverEvent => {
                serde_json::from_value(value.clone()).map(TaskPayload::DeliverEvent)
            }
            Self::InvokeDispatcher => {
                serde_json::from_value(value.clone()).map(TaskPayload::InvokeDispatcher)
            }
            Self::DeliverScheduled => {
                serde_json::from_value(value.clone()).map(TaskPayload::DeliverScheduled)
            }
        };
        parsed.map_err(|source| ValidationError { kind: self, source })
    }
}

impl TryFrom<&str> for TaskKind {
    type Error = ParseTaskKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| ParseTaskKindError(value.to_owned()))
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload for [`TaskKind::OrganizationCreated`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationCreatedPayload {
    /// Identifier of the created organization.
    pub id: String,
}

/// Discriminated description of what caused an endpoint index, one variant
/// per concrete source type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IndexSourceData {
    /// Requested by an operator.
    Manual,
    /// Requested through the public API.
    Api,
    /// Requested by internal housekeeping.
    Internal,
    /// Requested by an inbound webhook delivery.
    Hook {
        /// Identifier of the webhook delivery, when the sender supplied one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delivery_id: Option<String>,
    },
}

/// Payload for [`TaskKind::IndexEndpoint`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEndpointPayload {
    /// Endpoint to index.
    pub id: EndpointId,
    /// What caused the index.
    pub source: IndexSourceData,
    /// Free-form operator-facing reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Payload for [`TaskKind::ScheduleEmail`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEmailPayload {
    /// Recipient address.
    pub to: String,
    /// Message subject.
    pub subject: String,
    /// Message body.
    pub body: String,
}

/// Payload for [`TaskKind::StartInitialProjectDeployment`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartInitialProjectDeploymentPayload {
    /// Identifier of the freshly created project.
    pub id: String,
}

/// Payload for [`TaskKind::StartRun`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRunPayload {
    /// Run to admit.
    pub id: RunId,
}

/// Payload for [`TaskKind::PerformRunExecution`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformRunExecutionPayload {
    /// Run to execute.
    pub id: RunId,
}

/// Payload for [`TaskKind::PerformTaskOperation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformTaskOperationPayload {
    /// Task operation to perform.
    pub id: TaskOperationId,
}

/// Payload for [`TaskKind::RunFinished`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFinishedPayload {
    /// Run to finalize.
    pub id: RunId,
}

/// Payload for [`TaskKind::DeliverHttpSourceRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverHttpSourceRequestPayload {
    /// Identifier of the captured request to deliver.
    pub id: String,
}

/// Payload for [`TaskKind::RegisterSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterSourcePayload {
    /// Endpoint owning the registration.
    pub endpoint_id: EndpointId,
    /// Source registration body.
    pub source: SourceMetadata,
}

/// Payload for [`TaskKind::RegisterDynamicTrigger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterDynamicTriggerPayload {
    /// Endpoint owning the registration.
    pub endpoint_id: EndpointId,
    /// Trigger registration body.
    pub trigger: DynamicTriggerMetadata,
}

/// Payload for [`TaskKind::RegisterDynamicSchedule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterDynamicSchedulePayload {
    /// Endpoint owning the registration.
    pub endpoint_id: EndpointId,
    /// Schedule registration body.
    pub schedule: DynamicScheduleMetadata,
}

/// Payload for [`TaskKind::ActivateSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateSourcePayload {
    /// Source to activate.
    pub id: SourceId,
    /// Events captured before activation, re-delivered afterwards.
    #[serde(default)]
    pub orphaned_events: Vec<EventId>,
}

/// Payload for [`TaskKind::StartQueuedRuns`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartQueuedRunsPayload {
    /// Job whose queued runs should be promoted.
    pub id: JobId,
}

/// Payload for [`TaskKind::DeliverEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverEventPayload {
    /// Event to fan out.
    pub id: EventId,
}

/// Payload for [`TaskKind::InvokeDispatcher`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvokeDispatcherPayload {
    /// Dispatcher to invoke.
    pub id: DispatcherId,
    /// Event record that matched the dispatcher.
    pub event_record_id: EventId,
}

/// Payload for [`TaskKind::DeliverScheduled`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverScheduledPayload {
    /// Schedule dispatcher the tick belongs to.
    pub id: DispatcherId,
    /// Tick timestamps.
    pub payload: ScheduledPayload,
}

/// One concrete, schema-validated occurrence of a task kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskPayload {
    /// Payload of an `organizationCreated` instance.
    OrganizationCreated(OrganizationCreatedPayload),
    /// Payload of an `indexEndpoint` instance.
    IndexEndpoint(IndexEndpointPayload),
    /// Payload of a `scheduleEmail` instance.
    ScheduleEmail(ScheduleEmailPayload),
    /// Payload of a `startInitialProjectDeployment` instance.
    StartInitialProjectDeployment(StartInitialProjectDeploymentPayload),
    /// Payload of a `startRun` instance.
    StartRun(StartRunPayload),
    /// Payload of a `performRunExecution` instance.
    PerformRunExecution(PerformRunExecutionPayload),
    /// Payload of a `performTaskOperation` instance.
    PerformTaskOperation(PerformTaskOperationPayload),
    /// Payload of a `runFinished` instance.
    RunFinished(RunFinishedPayload),
    /// Payload of a `deliverHttpSourceRequest` instance.
    DeliverHttpSourceRequest(DeliverHttpSourceRequestPayload),
    /// Payload of a `registerSource` instance.
    RegisterSource(RegisterSourcePayload),
    /// Payload of a `registerDynamicTrigger` instance.
    RegisterDynamicTrigger(RegisterDynamicTriggerPayload),
    /// Payload of a `registerDynamicSchedule` instance.
    RegisterDynamicSchedule(RegisterDynamicSchedulePayload),
    /// Payload of an `activateSource` instance.
    ActivateSource(ActivateSourcePayload),
    /// Payload of a `startQueuedRuns` instance.
    StartQueuedRuns(StartQueuedRunsPayload),
    /// Payload of a `deliverEvent` instance.
    DeliverEvent(DeliverEventPayload),
    /// Payload of an `events.invokeDispatcher` instance.
    InvokeDispatcher(InvokeDispatcherPayload),
    /// Payload of an `events.deliverScheduled` instance.
    DeliverScheduled(DeliverScheduledPayload),
}

impl TaskPayload {
    /// Returns the kind this payload belongs to.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        match self {
            Self::OrganizationCreated(_) => TaskKind::OrganizationCreated,
            Self::IndexEndpoint(_) => TaskKind::IndexEndpoint,
            Self::ScheduleEmail(_) => TaskKind::ScheduleEmail,
            Self::StartInitialProjectDeployment(_) => TaskKind::StartInitialProjectDeployment,
            Self::StartRun(_) => TaskKind::StartRun,
            Self::PerformRunExecution(_) => TaskKind::PerformRunExecution,
            Self::PerformTaskOperation(_) => TaskKind::PerformTaskOperation,
            Self::RunFinished(_) => TaskKind::RunFinished,
            Self::DeliverHttpSourceRequest(_) => TaskKind::DeliverHttpSourceRequest,
            Self::RegisterSource(_) => TaskKind::RegisterSource,
            Self::RegisterDynamicTrigger(_) => TaskKind::RegisterDynamicTrigger,
            Self::RegisterDynamicSchedule(_) => TaskKind::RegisterDynamicSchedule,
            Self::ActivateSource(_) => TaskKind::ActivateSource,
            Self::StartQueuedRuns(_) => TaskKind::StartQueuedRuns,
            Self::DeliverEvent(_) => TaskKind::DeliverEvent,
            Self::InvokeDispatcher(_) => TaskKind::InvokeDispatcher,
            Self::DeliverScheduled(_) => TaskKind::DeliverScheduled,
        }
    }

    /// Serializes the payload for persistence.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error when serialization fails;
    /// payload types serialize infallibly in practice.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::OrganizationCreated(payload) => serde_json::to_value(payload),
            Self::IndexEndpoint(payload) => serde_json::to_value(payload),
            Self::ScheduleEmail(payload) => serde_json::to_value(payload),
            Self::StartInitialProjectDeployment(payload) => serde_json::to_value(payload),
            Self::StartRun(payload) => serde_json::to_value(payload),
            Self::PerformRunExecution(payload) => serde_json::to_value(payload),
            Self::PerformTaskOperation(payload) => serde_json::to_value(payload),
            Self::RunFinished(payload) => serde_json::to_value(payload),
            Self::DeliverHttpSourceRequest(payload) => serde_json::to_value(payload),
            Self::RegisterSource(payload) => serde_json::to_value(payload),
            Self::RegisterDynamicTrigger(payload) => serde_json::to_value(payload),
            Self::RegisterDynamicSchedule(payload) => serde_json::to_value(payload),
            Self::ActivateSource(payload) => serde_json::to_value(payload),
            Self::StartQueuedRuns(payload) => serde_json::to_value(payload),
            Self::DeliverEvent(payload) => serde_json::to_value(payload),
            Self::InvokeDispatcher(payload) => serde_json::to_value(payload),
            Self::DeliverScheduled(payload) => serde_json::to_value(payload),
        }
    }

    /// Returns the resource key used by per-resource queue routing.
    #[must_use]
    pub fn resource_key(&self) -> Option<&str> {
        match self {
            Self::PerformRunExecution(payload) => Some(payload.id.as_str()),
            Self::PerformTaskOperation(payload) => Some(payload.id.as_str()),
            Self::StartQueuedRuns(payload) => Some(payload.id.as_str()),
            _ => None,
        }
    }
}
