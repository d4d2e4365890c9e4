//! Application services for the durable task queue.

mod enqueue;
mod registry;
mod worker_pool;

pub use enqueue::EnqueueService;
pub use registry::{HandlerRegistry, RegistryError};
pub use worker_pool::{WorkerPool, WorkerPoolConfig, WorkerPoolHandle};
