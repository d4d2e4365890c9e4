//! Publish-side service: validate, route, persist.

use crate::queue::domain::{TaskCatalog, TaskInstance, TaskInstanceId, TaskKind, TaskPayload};
use crate::queue::ports::{EnqueueError, EnqueueOptions, EnqueueResult, Enqueuer, QueueStore};
use async_trait::async_trait;
use mockable::Clock;
use serde_json::Value;
use std::sync::Arc;

/// Enqueue service backed by a queue store and the task catalog.
///
/// Routing happens exactly once here: the resolved queue name, priority,
/// and attempt ceiling are copied onto the instance and never re-derived.
#[derive(Clone)]
pub struct EnqueueService<S, C>
where
    S: QueueStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    catalog: Arc<TaskCatalog>,
    clock: Arc<C>,
}

impl<S, C> EnqueueService<S, C>
where
    S: QueueStore,
    C: Clock + Send + Sync,
{
    /// Creates an enqueue service.
    #[must_use]
    pub const fn new(store: Arc<S>, catalog: Arc<TaskCatalog>, clock: Arc<C>) -> Self {
        Self {
            store,
            catalog,
            clock,
        }
    }

    /// Returns the catalog the service resolves against.
    #[must_use]
    pub fn catalog(&self) -> &TaskCatalog {
        &self.catalog
    }

    /// Validates an untyped JSON payload against `kind` and enqueues it.
    ///
    /// This is the boundary crossed by outer collaborators holding raw
    /// JSON; a payload that fails validation is rejected synchronously and
    /// never persisted.
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError::Validation`] on schema violation, or any
    /// error of [`Enqueuer::enqueue`].
    pub async fn enqueue_json(
        &self,
        kind: TaskKind,
        payload: &Value,
        options: EnqueueOptions,
    ) -> EnqueueResult<TaskInstanceId> {
        let resolved = self.catalog.resolve(kind, payload)?;
        self.persist(resolved.payload, options).await
    }

    async fn persist(
        &self,
        payload: TaskPayload,
        options: EnqueueOptions,
    ) -> EnqueueResult<TaskInstanceId> {
        let definition = self.catalog.definition(payload.kind());
        let instance_id = TaskInstanceId::new();
        let queue_name = definition.routing().queue_for(&payload, instance_id)?;
        let value = payload
            .to_value()
            .map_err(|err| EnqueueError::Serialization(Arc::new(err)))?;

        let instance = TaskInstance::enqueued(
            instance_id,
            payload.kind(),
            value,
            queue_name,
            options.priority().unwrap_or_else(|| definition.priority()),
            options
                .max_attempts()
                .unwrap_or_else(|| definition.max_attempts()),
            &*self.clock,
        );
        self.store.insert(&instance).await?;
        Ok(instance_id)
    }
}

#[async_trait]
impl<S, C> Enqueuer for EnqueueService<S, C>
where
    S: QueueStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn enqueue(
        &self,
        payload: TaskPayload,
        options: EnqueueOptions,
    ) -> EnqueueResult<TaskInstanceId> {
        self.persist(payload, options).await
    }
}
