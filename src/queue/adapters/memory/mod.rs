//! In-memory adapters for the durable queue.

mod store;

pub use store::InMemoryQueueStore;
