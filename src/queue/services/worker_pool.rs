//! Bounded worker pool driving task execution.
//!
//! Each worker loops claim → execute → record outcome; the reaper loop
//! periodically reclaims instances abandoned past their visibility
//! deadline. A handler failure is recorded and logged, never propagated:
//! one broken handler cannot take down other in-flight claims.

use crate::queue::domain::{FailureOutcome, TaskInstance, WorkerId};
use crate::queue::ports::{HandlerError, QueueStore};
use crate::queue::services::HandlerRegistry;
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Ceiling on the visibility timeout: one day.
const MAX_VISIBILITY_TIMEOUT: Duration = Duration::from_secs(86_400);

/// Tuning knobs of the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    concurrency: usize,
    poll_interval: Duration,
    visibility_timeout: Duration,
    reap_interval: Duration,
}

impl WorkerPoolConfig {
    /// Creates the default configuration: five workers, one-second poll,
    /// thirty-second visibility timeout, five-second reap cadence.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            concurrency: 5,
            poll_interval: Duration::from_secs(1),
            visibility_timeout: Duration::from_secs(30),
            reap_interval: Duration::from_secs(5),
        }
    }

    /// Sets the number of concurrent workers.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Sets the delay between empty claim attempts.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Sets the visibility timeout stamped on claims; handler invocations
    /// are bounded by the same duration so a timed-out handler and the
    /// reaper agree on when an instance is abandoned. Values above one
    /// day are clamped to the ceiling.
    #[must_use]
    pub const fn with_visibility_timeout(mut self, visibility_timeout: Duration) -> Self {
        self.visibility_timeout =
            if visibility_timeout.as_secs() >= MAX_VISIBILITY_TIMEOUT.as_secs() {
                MAX_VISIBILITY_TIMEOUT
            } else {
                visibility_timeout
            };
        self
    }

    /// Sets the reaper cadence.
    #[must_use]
    pub const fn with_reap_interval(mut self, reap_interval: Duration) -> Self {
        self.reap_interval = reap_interval;
        self
    }

    /// Returns the number of concurrent workers.
    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns the delay between empty claim attempts.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the visibility timeout.
    #[must_use]
    pub const fn visibility_timeout(&self) -> Duration {
        self.visibility_timeout
    }

    /// Returns the reaper cadence.
    #[must_use]
    pub const fn reap_interval(&self) -> Duration {
        self.reap_interval
    }

    fn claim_timeout(&self) -> chrono::Duration {
        // The clamp in `with_visibility_timeout` keeps this conversion in
        // range; the fallback mirrors the same ceiling.
        chrono::Duration::from_std(self.visibility_timeout)
            .unwrap_or_else(|_| chrono::Duration::seconds(86_400))
    }
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded pool of workers sharing one queue store.
pub struct WorkerPool<S, C>
where
    S: QueueStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    registry: Arc<HandlerRegistry>,
    clock: Arc<C>,
    config: WorkerPoolConfig,
}

impl<S, C> WorkerPool<S, C>
where
    S: QueueStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a pool; nothing runs until [`WorkerPool::start`].
    #[must_use]
    pub const fn new(
        store: Arc<S>,
        registry: Arc<HandlerRegistry>,
        clock: Arc<C>,
        config: WorkerPoolConfig,
    ) -> Self {
        Self {
            store,
            registry,
            clock,
            config,
        }
    }

    /// Spawns the worker and reaper loops onto the current tokio runtime.
    #[must_use]
    pub fn start(self) -> WorkerPoolHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut handles = Vec::with_capacity(self.config.concurrency().saturating_add(1));

        for index in 0..self.config.concurrency() {
            let worker = Worker {
                id: WorkerId::indexed(index),
                store: Arc::clone(&self.store),
                registry: Arc::clone(&self.registry),
                clock: Arc::clone(&self.clock),
                config: self.config,
            };
            handles.push(tokio::spawn(worker.run(shutdown_rx.clone())));
        }
        handles.push(tokio::spawn(reaper_loop(
            Arc::clone(&self.store),
            Arc::clone(&self.clock),
            self.config,
            shutdown_rx,
        )));

        WorkerPoolHandle {
            shutdown_tx,
            handles,
        }
    }
}

/// Running pool; dropping it detaches the loops, [`WorkerPoolHandle::shutdown`]
/// stops them.
pub struct WorkerPoolHandle {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPoolHandle {
    /// Signals every loop to stop and waits for them to finish their
    /// current work.
    pub async fn shutdown(self) {
        self.shutdown_tx.send(true).ok();
        for handle in self.handles {
            handle.await.ok();
        }
    }
}

struct Worker<S, C>
where
    S: QueueStore,
    C: Clock + Send + Sync,
{
    id: WorkerId,
    store: Arc<S>,
    registry: Arc<HandlerRegistry>,
    clock: Arc<C>,
    config: WorkerPoolConfig,
}

impl<S, C> Worker<S, C>
where
    S: QueueStore + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }
            let now = self.clock.utc();
            match self
                .store
                .claim_next(&self.id, now, self.config.claim_timeout())
                .await
            {
                Ok(Some(instance)) => self.execute(instance).await,
                Ok(None) => idle(&mut shutdown, self.config.poll_interval()).await,
                Err(err) => {
                    warn!(worker = %self.id, error = %err, "claim attempt failed");
                    idle(&mut shutdown, self.config.poll_interval()).await;
                }
            }
        }
    }

    async fn execute(&self, instance: TaskInstance) {
        let attempt = instance.attempts().saturating_add(1);
        let started = std::time::Instant::now();
        let result = self.invoke_handler(&instance).await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let now = self.clock.utc();

        match result {
            Ok(()) => {
                if let Err(err) = self.store.complete(instance.id(), now).await {
                    warn!(
                        worker = %self.id,
                        instance = %instance.id(),
                        error = %err,
                        "failed to record task completion"
                    );
                    return;
                }
                info!(
                    worker = %self.id,
                    kind = %instance.kind(),
                    instance = %instance.id(),
                    queue = %instance.queue_name(),
                    attempt,
                    latency_ms,
                    outcome = "succeeded",
                    "task instance completed"
                );
            }
            Err(handler_error) => {
                self.record_failure(&instance, &handler_error, attempt, latency_ms, now)
                    .await;
            }
        }
    }

    async fn invoke_handler(&self, instance: &TaskInstance) -> Result<(), HandlerError> {
        let payload = instance
            .kind()
            .parse_payload(instance.payload())
            .map_err(HandlerError::failed)?;
        let handler = self
            .registry
            .handler(instance.kind())
            .ok_or_else(|| HandlerError::message("no handler registered for task kind"))?;

        // Handlers run on a dedicated task; a panic lands here as a
        // `JoinError` instead of unwinding the worker loop.
        let invocation = tokio::spawn(async move { handler.handle(payload).await });
        let aborter = invocation.abort_handle();
        match tokio::time::timeout(self.config.visibility_timeout(), invocation).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(HandlerError::message(format!(
                "handler panicked: {join_error}"
            ))),
            Err(_) => {
                aborter.abort();
                Err(HandlerError::message(
                    "handler exceeded its visibility deadline",
                ))
            }
        }
    }

    async fn record_failure(
        &self,
        instance: &TaskInstance,
        handler_error: &HandlerError,
        attempt: u32,
        latency_ms: u64,
        now: chrono::DateTime<chrono::Utc>,
    ) {
        match self
            .store
            .fail(instance.id(), &handler_error.to_string(), now)
            .await
        {
            Ok(FailureOutcome::Retrying { next_eligible_at }) => {
                warn!(
                    worker = %self.id,
                    kind = %instance.kind(),
                    instance = %instance.id(),
                    queue = %instance.queue_name(),
                    attempt,
                    latency_ms,
                    outcome = "failed_retryable",
                    retry_at = %next_eligible_at,
                    error = %handler_error,
                    "task instance failed, will retry"
                );
            }
            Ok(FailureOutcome::Exhausted) => {
                error!(
                    worker = %self.id,
                    kind = %instance.kind(),
                    instance = %instance.id(),
                    queue = %instance.queue_name(),
                    attempt,
                    latency_ms,
                    outcome = "failed_terminal",
                    error = %handler_error,
                    "task instance exhausted its attempts"
                );
            }
            Err(err) => {
                warn!(
                    worker = %self.id,
                    instance = %instance.id(),
                    error = %err,
                    "failed to record task failure"
                );
            }
        }
    }
}

async fn reaper_loop<S, C>(
    store: Arc<S>,
    clock: Arc<C>,
    config: WorkerPoolConfig,
    mut shutdown: watch::Receiver<bool>,
) where
    S: QueueStore,
    C: Clock + Send + Sync,
{
    loop {
        if *shutdown.borrow() {
            break;
        }
        idle(&mut shutdown, config.reap_interval()).await;
        match store.reap(clock.utc()).await {
            Ok(reclaimed) if !reclaimed.is_empty() => {
                warn!(
                    count = reclaimed.len(),
                    "reclaimed task instances past their visibility deadline"
                );
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "reap pass failed"),
        }
    }
}

async fn idle(shutdown: &mut watch::Receiver<bool>, duration: Duration) {
    tokio::select! {
        _ = shutdown.changed() => {}
        () = tokio::time::sleep(duration) => {}
    }
}
