//! Domain model for the durable task queue.
//!
//! The queue owns task instances and their execution status machine; the
//! catalog binds each task kind to a payload schema, a routing rule, a
//! priority, and an attempt ceiling.

mod catalog;
mod error;
mod ids;
mod instance;
mod kind;
mod retry;

pub use catalog::{
    DEFAULT_MAX_ATTEMPTS, EVENT_DISPATCHER_QUEUE, EXECUTIONS_QUEUE, INTERNAL_QUEUE, QueueRouting,
    ResolvedTask, TaskCatalog, TaskDefinition,
};
pub use error::{ParseTaskKindError, ParseTaskStatusError, QueueDomainError, ValidationError};
pub use ids::{QueueName, TaskInstanceId, WorkerId};
pub use instance::{FailureOutcome, PersistedTaskInstanceData, TaskInstance, TaskStatus};
pub use kind::{
    ActivateSourcePayload, DeliverEventPayload, DeliverHttpSourceRequestPayload,
    DeliverScheduledPayload, IndexEndpointPayload, IndexSourceData, InvokeDispatcherPayload,
    OrganizationCreatedPayload, PerformRunExecutionPayload, PerformTaskOperationPayload,
    RegisterDynamicSchedulePayload, RegisterDynamicTriggerPayload, RegisterSourcePayload,
    RunFinishedPayload, ScheduleEmailPayload, StartInitialProjectDeploymentPayload,
    StartQueuedRunsPayload, StartRunPayload, TaskKind, TaskPayload,
};
pub use retry::RetryPolicy;
