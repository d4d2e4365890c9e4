//! Service layer for dynamic trigger, schedule, and source registration.
//!
//! Every registration is an idempotent upsert: re-registering the same
//! `(endpoint, slug)` or `(endpoint, key)` updates the existing record in
//! place and keeps its identifier stable, so a retried registration task is
//! harmless.

use crate::event::domain::{
    Dispatchable, Dispatcher, DispatcherId, DynamicScheduleMetadata, DynamicTriggerMetadata,
    EndpointId, EventDomainError, EventId, JobRegistration, Source, SourceId, SourceMetadata,
};
use crate::event::ports::{
    DispatcherRepository, DispatcherRepositoryError, SourceRepository, SourceRepositoryError,
};
use crate::queue::domain::{DeliverEventPayload, TaskPayload};
use crate::queue::ports::{EnqueueError, EnqueueOptions, Enqueuer};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Service-level errors for registration operations.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The source was not found.
    #[error("source not found: {0}")]
    SourceNotFound(SourceId),
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] EventDomainError),
    /// Dispatcher repository operation failed.
    #[error(transparent)]
    Dispatchers(#[from] DispatcherRepositoryError),
    /// Source repository operation failed.
    #[error(transparent)]
    Sources(#[from] SourceRepositoryError),
    /// Enqueueing orphaned-event delivery failed.
    #[error(transparent)]
    Enqueue(#[from] EnqueueError),
}

/// Result type for registration service operations.
pub type RegistrationResult<T> = Result<T, RegistrationError>;

/// Dynamic registration orchestration service.
pub struct RegistrationService<D, S, C>
where
    D: DispatcherRepository,
    S: SourceRepository,
    C: Clock + Send + Sync,
{
    dispatchers: Arc<D>,
    sources: Arc<S>,
    enqueuer: Arc<dyn Enqueuer>,
    clock: Arc<C>,
}

impl<D, S, C> RegistrationService<D, S, C>
where
    D: DispatcherRepository,
    S: SourceRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new registration service.
    #[must_use]
    pub fn new(
        dispatchers: Arc<D>,
        sources: Arc<S>,
        enqueuer: Arc<dyn Enqueuer>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            dispatchers,
            sources,
            enqueuer,
            clock,
        }
    }

    /// Registers or updates a dynamic trigger dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Domain`] when the slug is blank, or when
    /// persistence fails.
    pub async fn register_dynamic_trigger(
        &self,
        endpoint_id: &EndpointId,
        trigger: DynamicTriggerMetadata,
    ) -> RegistrationResult<Dispatcher> {
        let dispatchable = Dispatchable::Trigger {
            event_name: trigger.event_name,
        };
        self.upsert_dispatcher(endpoint_id, &trigger.id, dispatchable, trigger.jobs)
            .await
    }

    /// Registers or updates a dynamic schedule dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Domain`] when the slug is blank, or when
    /// persistence fails.
    pub async fn register_dynamic_schedule(
        &self,
        endpoint_id: &EndpointId,
        schedule: DynamicScheduleMetadata,
    ) -> RegistrationResult<Dispatcher> {
        let dispatchable = Dispatchable::Schedule {
            schedule: schedule.schedule,
        };
        self.upsert_dispatcher(endpoint_id, &schedule.id, dispatchable, schedule.jobs)
            .await
    }

    /// Registers or updates an ingestion source; new sources start inactive.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::Sources`] when persistence fails.
    pub async fn register_source(
        &self,
        endpoint_id: &EndpointId,
        metadata: SourceMetadata,
    ) -> RegistrationResult<Source> {
        let source = match self
            .sources
            .find_by_key(endpoint_id, &metadata.key)
            .await?
        {
            Some(mut existing) => {
                existing.update_channel(metadata.channel, &*self.clock);
                existing
            }
            None => Source::new(
                SourceId::new(format!("src_{}", Uuid::new_v4().simple())),
                endpoint_id.clone(),
                metadata,
                &*self.clock,
            ),
        };
        self.sources.upsert(&source).await?;
        info!(source = %source.id(), endpoint = %endpoint_id, key = %source.key(), "source registered");
        Ok(source)
    }

    /// Activates a source and re-delivers events orphaned before activation.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::SourceNotFound`] when the source does
    /// not exist, or when persistence or enqueueing fails.
    pub async fn activate_source(
        &self,
        id: &SourceId,
        orphaned_events: Vec<EventId>,
    ) -> RegistrationResult<Source> {
        let mut source = self
            .sources
            .find_by_id(id)
            .await?
            .ok_or_else(|| RegistrationError::SourceNotFound(id.clone()))?;
        source.activate(&*self.clock);
        self.sources.upsert(&source).await?;

        let orphaned = orphaned_events.len();
        for event_id in orphaned_events {
            self.enqueuer
                .enqueue(
                    TaskPayload::DeliverEvent(DeliverEventPayload { id: event_id }),
                    EnqueueOptions::new(),
                )
                .await?;
        }
        info!(source = %id, orphaned, "source activated");
        Ok(source)
    }

    async fn upsert_dispatcher(
        &self,
        endpoint_id: &EndpointId,
        slug: &str,
        dispatchable: Dispatchable,
        jobs: Vec<JobRegistration>,
    ) -> RegistrationResult<Dispatcher> {
        let dispatcher = match self.dispatchers.find_by_key(endpoint_id, slug).await? {
            Some(mut existing) => {
                existing.update_registration(dispatchable, jobs, &*self.clock);
                existing
            }
            None => Dispatcher::new(
                DispatcherId::new(format!("disp_{}", Uuid::new_v4().simple())),
                endpoint_id.clone(),
                slug,
                dispatchable,
                jobs,
                &*self.clock,
            )?,
        };
        self.dispatchers.upsert(&dispatcher).await?;
        info!(
            dispatcher = %dispatcher.id(),
            endpoint = %endpoint_id,
            slug,
            "dispatcher registered"
        );
        Ok(dispatcher)
    }
}
