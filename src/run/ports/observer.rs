//! Notification port for finalized runs.

use crate::run::domain::Run;
use async_trait::async_trait;

/// Contract notified once per run after finalization.
///
/// Observation is best-effort and infallible: the run is already terminal
/// when the observer fires, so an observer cannot veto or retry it.
#[async_trait]
pub trait RunObserver: Send + Sync {
    /// Called exactly once after a run reaches a terminal status.
    async fn run_finished(&self, run: &Run);
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRunObserver;

#[async_trait]
impl RunObserver for NullRunObserver {
    async fn run_finished(&self, _run: &Run) {}
}
