//! Service layer fanning events out to dispatchers and their jobs.
//!
//! Delivery is a two-stage pipeline, each stage its own queue task:
//! `deliverEvent` fans an event record out to every matching dispatcher,
//! and `events.invokeDispatcher` starts one run per job registered against
//! a single dispatcher. Scheduled ticks skip matching and deliver straight
//! to their dispatcher via `events.deliverScheduled`.

use crate::event::domain::{
    Dispatcher, DispatcherId, EventDomainError, EventId, EventRecord, SCHEDULED_EVENT_NAME,
    ScheduledPayload,
};
use crate::event::ports::{
    DispatcherRepository, DispatcherRepositoryError, EventRepository, EventRepositoryError,
    RunStarter, RunStarterError,
};
use crate::queue::domain::{DeliverEventPayload, InvokeDispatcherPayload, TaskPayload};
use crate::queue::ports::{EnqueueError, EnqueueOptions, Enqueuer};
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// Service-level errors for event dispatch operations.
#[derive(Debug, Error)]
pub enum EventDispatchError {
    /// The event record was not found.
    #[error("event not found: {0}")]
    EventNotFound(EventId),
    /// The dispatcher was not found.
    #[error("dispatcher not found: {0}")]
    DispatcherNotFound(DispatcherId),
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] EventDomainError),
    /// Event repository operation failed.
    #[error(transparent)]
    Events(#[from] EventRepositoryError),
    /// Dispatcher repository operation failed.
    #[error(transparent)]
    Dispatchers(#[from] DispatcherRepositoryError),
    /// Starting a run failed.
    #[error(transparent)]
    Starter(#[from] RunStarterError),
    /// Enqueueing a follow-up task failed.
    #[error(transparent)]
    Enqueue(#[from] EnqueueError),
    /// Serializing a scheduled payload failed.
    #[error("failed to serialize scheduled payload: {0}")]
    Serialization(Arc<serde_json::Error>),
}

/// Result type for event dispatch service operations.
pub type EventDispatchResult<T> = Result<T, EventDispatchError>;

/// Event dispatch orchestration service.
pub struct EventDispatchService<V, D, C>
where
    V: EventRepository,
    D: DispatcherRepository,
    C: Clock + Send + Sync,
{
    events: Arc<V>,
    dispatchers: Arc<D>,
    starter: Arc<dyn RunStarter>,
    enqueuer: Arc<dyn Enqueuer>,
    clock: Arc<C>,
}

impl<V, D, C> EventDispatchService<V, D, C>
where
    V: EventRepository,
    D: DispatcherRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new event dispatch service.
    #[must_use]
    pub fn new(
        events: Arc<V>,
        dispatchers: Arc<D>,
        starter: Arc<dyn RunStarter>,
        enqueuer: Arc<dyn Enqueuer>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            events,
            dispatchers,
            starter,
            enqueuer,
            clock,
        }
    }

    /// Ingests an event: persists the record and enqueues its delivery.
    ///
    /// # Errors
    ///
    /// Returns [`EventDispatchError::Domain`] when the event name is blank,
    /// or when persistence or enqueueing fails.
    pub async fn ingest(
        &self,
        name: impl Into<String> + Send,
        source: impl Into<String> + Send,
        payload: Value,
    ) -> EventDispatchResult<EventRecord> {
        let event_id = EventId::new(format!("evt_{}", Uuid::new_v4().simple()));
        let event = EventRecord::new(event_id.clone(), name, source, payload, &*self.clock)?;
        self.events.store(&event).await?;
        self.enqueuer
            .enqueue(
                TaskPayload::DeliverEvent(DeliverEventPayload { id: event_id }),
                EnqueueOptions::new(),
            )
            .await?;
        info!(event = %event.id(), name = %event.name(), "event ingested");
        Ok(event)
    }

    /// Fans an event out to every matching dispatcher.
    ///
    /// Delivery is idempotent: an event already marked delivered is left
    /// alone, so a retried delivery task cannot double-invoke dispatchers.
    ///
    /// # Errors
    ///
    /// Returns [`EventDispatchError::EventNotFound`] when the event does not
    /// exist, or when lookups or enqueueing fail.
    pub async fn deliver_event(&self, id: &EventId) -> EventDispatchResult<()> {
        let mut event = self.load_event(id).await?;
        if event.delivered_at().is_some() {
            debug!(event = %id, "event already delivered, nothing to do");
            return Ok(());
        }

        let matching = self.dispatchers.find_matching(event.name()).await?;
        for dispatcher in &matching {
            self.enqueuer
                .enqueue(
                    TaskPayload::InvokeDispatcher(InvokeDispatcherPayload {
                        id: dispatcher.id().clone(),
                        event_record_id: id.clone(),
                    }),
                    EnqueueOptions::new(),
                )
                .await?;
        }
        event.mark_delivered(&*self.clock);
        self.events.update(&event).await?;
        info!(event = %id, dispatchers = matching.len(), "event delivered");
        Ok(())
    }

    /// Starts one run per job registered against a dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`EventDispatchError::DispatcherNotFound`] or
    /// [`EventDispatchError::EventNotFound`] when either side is missing, or
    /// when starting a run fails.
    pub async fn invoke_dispatcher(
        &self,
        id: &DispatcherId,
        event_record_id: &EventId,
    ) -> EventDispatchResult<()> {
        let dispatcher = self.load_dispatcher(id).await?;
        let event = self.load_event(event_record_id).await?;
        self.start_registered_jobs(&dispatcher, &event).await
    }

    /// Delivers a schedule tick: synthesizes a scheduled event record and
    /// starts the dispatcher's registered jobs.
    ///
    /// # Errors
    ///
    /// Returns [`EventDispatchError::Domain`] when the dispatcher is not a
    /// schedule, [`EventDispatchError::DispatcherNotFound`] when it is
    /// missing, or when persistence or starting a run fails.
    pub async fn deliver_scheduled(
        &self,
        id: &DispatcherId,
        payload: ScheduledPayload,
    ) -> EventDispatchResult<()> {
        let dispatcher = self.load_dispatcher(id).await?;
        dispatcher.schedule()?;

        let body = serde_json::to_value(payload)
            .map_err(|err| EventDispatchError::Serialization(Arc::new(err)))?;
        let event_id = EventId::new(format!("evt_{}", Uuid::new_v4().simple()));
        let mut event = EventRecord::new(
            event_id,
            SCHEDULED_EVENT_NAME,
            "scheduler",
            body,
            &*self.clock,
        )?;
        event.mark_delivered(&*self.clock);
        self.events.store(&event).await?;
        self.start_registered_jobs(&dispatcher, &event).await
    }

    async fn start_registered_jobs(
        &self,
        dispatcher: &Dispatcher,
        event: &EventRecord,
    ) -> EventDispatchResult<()> {
        for job in dispatcher.jobs() {
            let run_id = self.starter.create_run_for_job(job.id.clone()).await?;
            info!(
                dispatcher = %dispatcher.id(),
                event = %event.id(),
                job = %job.id,
                run = %run_id,
                "dispatcher started run"
            );
        }
        Ok(())
    }

    async fn load_event(&self, id: &EventId) -> EventDispatchResult<EventRecord> {
        self.events
            .find_by_id(id)
            .await?
            .ok_or_else(|| EventDispatchError::EventNotFound(id.clone()))
    }

    async fn load_dispatcher(&self, id: &DispatcherId) -> EventDispatchResult<Dispatcher> {
        self.dispatchers
            .find_by_id(id)
            .await?
            .ok_or_else(|| EventDispatchError::DispatcherNotFound(id.clone()))
    }
}
