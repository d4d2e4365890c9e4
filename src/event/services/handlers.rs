//! Task handlers binding the dispatch pipeline to the queue.

use crate::event::ports::{DispatcherRepository, EventRepository, SourceRepository};
use crate::event::services::{EventDispatchService, RegistrationService};
use crate::queue::domain::{TaskKind, TaskPayload};
use crate::queue::ports::{HandlerError, HandlerResult, TaskHandler};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;

/// Dispatches the three delivery task kinds onto the dispatch service.
///
/// One instance is registered under each of `deliverEvent`,
/// `events.invokeDispatcher`, and `events.deliverScheduled`.
pub struct EventTaskHandler<V, D, C>
where
    V: EventRepository,
    D: DispatcherRepository,
    C: Clock + Send + Sync,
{
    service: Arc<EventDispatchService<V, D, C>>,
}

impl<V, D, C> EventTaskHandler<V, D, C>
where
    V: EventRepository,
    D: DispatcherRepository,
    C: Clock + Send + Sync,
{
    /// Creates a handler over the dispatch service.
    #[must_use]
    pub const fn new(service: Arc<EventDispatchService<V, D, C>>) -> Self {
        Self { service }
    }

    /// Returns the task kinds this handler must be registered under.
    #[must_use]
    pub const fn kinds() -> [TaskKind; 3] {
        [
            TaskKind::DeliverEvent,
            TaskKind::InvokeDispatcher,
            TaskKind::DeliverScheduled,
        ]
    }
}

#[async_trait]
impl<V, D, C> TaskHandler for EventTaskHandler<V, D, C>
where
    V: EventRepository + 'static,
    D: DispatcherRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn handle(&self, payload: TaskPayload) -> HandlerResult<()> {
        match payload {
            TaskPayload::DeliverEvent(payload) => self
                .service
                .deliver_event(&payload.id)
                .await
                .map_err(HandlerError::failed),
            TaskPayload::InvokeDispatcher(payload) => self
                .service
                .invoke_dispatcher(&payload.id, &payload.event_record_id)
                .await
                .map_err(HandlerError::failed),
            TaskPayload::DeliverScheduled(payload) => self
                .service
                .deliver_scheduled(&payload.id, payload.payload)
                .await
                .map_err(HandlerError::failed),
            other => Err(HandlerError::UnexpectedPayload { kind: other.kind() }),
        }
    }
}

/// Dispatches the four registration task kinds onto the registration
/// service.
///
/// One instance is registered under each of `registerSource`,
/// `registerDynamicTrigger`, `registerDynamicSchedule`, and
/// `activateSource`.
pub struct RegistrationTaskHandler<D, S, C>
where
    D: DispatcherRepository,
    S: SourceRepository,
    C: Clock + Send + Sync,
{
    service: Arc<RegistrationService<D, S, C>>,
}

impl<D, S, C> RegistrationTaskHandler<D, S, C>
where
    D: DispatcherRepository,
    S: SourceRepository,
    C: Clock + Send + Sync,
{
    /// Creates a handler over the registration service.
    #[must_use]
    pub const fn new(service: Arc<RegistrationService<D, S, C>>) -> Self {
        Self { service }
    }

    /// Returns the task kinds this handler must be registered under.
    #[must_use]
    pub const fn kinds() -> [TaskKind; 4] {
        [
            TaskKind::RegisterSource,
            TaskKind::RegisterDynamicTrigger,
            TaskKind::RegisterDynamicSchedule,
            TaskKind::ActivateSource,
        ]
    }
}

#[async_trait]
impl<D, S, C> TaskHandler for RegistrationTaskHandler<D, S, C>
where
    D: DispatcherRepository + 'static,
    S: SourceRepository + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn handle(&self, payload: TaskPayload) -> HandlerResult<()> {
        match payload {
            TaskPayload::RegisterSource(payload) => self
                .service
                .register_source(&payload.endpoint_id, payload.source)
                .await
                .map(|_| ())
                .map_err(HandlerError::failed),
            TaskPayload::RegisterDynamicTrigger(payload) => self
                .service
                .register_dynamic_trigger(&payload.endpoint_id, payload.trigger)
                .await
                .map(|_| ())
                .map_err(HandlerError::failed),
            TaskPayload::RegisterDynamicSchedule(payload) => self
                .service
                .register_dynamic_schedule(&payload.endpoint_id, payload.schedule)
                .await
                .map(|_| ())
                .map_err(HandlerError::failed),
            TaskPayload::ActivateSource(payload) => self
                .service
                .activate_source(&payload.id, payload.orphaned_events)
                .await
                .map(|_| ())
                .map_err(HandlerError::failed),
            other => Err(HandlerError::UnexpectedPayload { kind: other.kind() }),
        }
    }
}
