//! Assembly of the queue, run, and event contexts into one running system.
//!
//! The builder wires an enqueue service over the chosen store eagerly, so
//! handler constructors that publish follow-up work can borrow the
//! enqueuer before the pool exists. [`ConveyorBuilder::build`] refuses to
//! assemble a system whose handler registry does not cover every task kind
//! in the catalog.

use crate::queue::domain::{TaskCatalog, TaskKind};
use crate::queue::ports::{Enqueuer, QueueStore, TaskHandler};
use crate::queue::services::{
    EnqueueService, HandlerRegistry, RegistryError, WorkerPool, WorkerPoolConfig, WorkerPoolHandle,
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Errors returned while assembling the system.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BootstrapError {
    /// Handler registration was incomplete or contradictory.
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Builder wiring stores, handlers, and pool configuration together.
pub struct ConveyorBuilder<S, C>
where
    S: QueueStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    catalog: Arc<TaskCatalog>,
    config: WorkerPoolConfig,
    enqueuer: Arc<EnqueueService<S, C>>,
    bindings: Vec<(TaskKind, Arc<dyn TaskHandler>)>,
}

impl<S, C> ConveyorBuilder<S, C>
where
    S: QueueStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a builder over a queue store and clock with the built-in
    /// catalog and default pool configuration.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        let catalog = Arc::new(TaskCatalog::builtin());
        let enqueuer = Arc::new(EnqueueService::new(
            Arc::clone(&store),
            Arc::clone(&catalog),
            Arc::clone(&clock),
        ));
        Self {
            store,
            clock,
            catalog,
            config: WorkerPoolConfig::default(),
            enqueuer,
            bindings: Vec::new(),
        }
    }

    /// Replaces the task catalog; also rebuilds the enqueue service, so
    /// call this before handing the enqueuer out.
    #[must_use]
    pub fn with_catalog(mut self, catalog: TaskCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self.enqueuer = Arc::new(EnqueueService::new(
            Arc::clone(&self.store),
            Arc::clone(&self.catalog),
            Arc::clone(&self.clock),
        ));
        self
    }

    /// Replaces the worker pool configuration.
    #[must_use]
    pub fn with_pool_config(mut self, config: WorkerPoolConfig) -> Self {
        self.config = config;
        self
    }

    /// Binds a handler to one task kind.
    #[must_use]
    pub fn with_handler(mut self, kind: TaskKind, handler: Arc<dyn TaskHandler>) -> Self {
        self.bindings.push((kind, handler));
        self
    }

    /// Binds one handler to several task kinds, for handlers that dispatch
    /// internally on the payload variant.
    #[must_use]
    pub fn with_handler_for_kinds(
        mut self,
        kinds: impl IntoIterator<Item = TaskKind>,
        handler: Arc<dyn TaskHandler>,
    ) -> Self {
        for kind in kinds {
            self.bindings.push((kind, Arc::clone(&handler)));
        }
        self
    }

    /// Returns the enqueue service, usable before the system is built.
    #[must_use]
    pub fn enqueue_service(&self) -> Arc<EnqueueService<S, C>> {
        Arc::clone(&self.enqueuer)
    }

    /// Returns the enqueuer port, usable before the system is built.
    #[must_use]
    pub fn enqueuer(&self) -> Arc<dyn Enqueuer> {
        Arc::clone(&self.enqueuer) as Arc<dyn Enqueuer>
    }

    /// Assembles the system.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Registry`] when a kind is bound twice or
    /// any catalog kind is left without a handler.
    pub fn build(self) -> Result<Conveyor<S, C>, BootstrapError> {
        let mut registry = HandlerRegistry::new();
        for (kind, handler) in self.bindings {
            registry.register(kind, handler)?;
        }
        registry.ensure_complete()?;

        let pool = WorkerPool::new(
            Arc::clone(&self.store),
            Arc::new(registry),
            Arc::clone(&self.clock),
            self.config,
        );
        Ok(Conveyor {
            enqueuer: self.enqueuer,
            pool,
        })
    }
}

/// A fully wired but not yet running system.
pub struct Conveyor<S, C>
where
    S: QueueStore,
    C: Clock + Send + Sync,
{
    enqueuer: Arc<EnqueueService<S, C>>,
    pool: WorkerPool<S, C>,
}

impl<S, C> Conveyor<S, C>
where
    S: QueueStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Returns the enqueue service.
    #[must_use]
    pub fn enqueue_service(&self) -> Arc<EnqueueService<S, C>> {
        Arc::clone(&self.enqueuer)
    }

    /// Returns the enqueuer port.
    #[must_use]
    pub fn enqueuer(&self) -> Arc<dyn Enqueuer> {
        Arc::clone(&self.enqueuer) as Arc<dyn Enqueuer>
    }

    /// Starts the worker pool on the current tokio runtime.
    #[must_use]
    pub fn start(self) -> ConveyorHandle<S, C> {
        ConveyorHandle {
            enqueuer: self.enqueuer,
            pool: self.pool.start(),
        }
    }
}

/// A running system.
pub struct ConveyorHandle<S, C>
where
    S: QueueStore,
    C: Clock + Send + Sync,
{
    enqueuer: Arc<EnqueueService<S, C>>,
    pool: WorkerPoolHandle,
}

impl<S, C> ConveyorHandle<S, C>
where
    S: QueueStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Returns the enqueue service.
    #[must_use]
    pub fn enqueue_service(&self) -> Arc<EnqueueService<S, C>> {
        Arc::clone(&self.enqueuer)
    }

    /// Returns the enqueuer port.
    #[must_use]
    pub fn enqueuer(&self) -> Arc<dyn Enqueuer> {
        Arc::clone(&self.enqueuer) as Arc<dyn Enqueuer>
    }

    /// Stops the worker pool and waits for in-flight work to settle.
    pub async fn shutdown(self) {
        self.pool.shutdown().await;
    }
}
