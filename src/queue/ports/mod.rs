//! Port contracts for the durable task queue.
//!
//! Ports define infrastructure-agnostic interfaces used by the queue
//! services and by everything that publishes or executes work.

pub mod enqueue;
pub mod handler;
pub mod store;

pub use enqueue::{EnqueueError, EnqueueOptions, EnqueueResult, Enqueuer};
pub use handler::{HandlerError, HandlerResult, TaskHandler};
pub use store::{QueueStore, QueueStoreError, QueueStoreResult};
