//! `PostgreSQL` adapters for durable queue persistence.

mod models;
mod schema;
mod store;

pub use store::{PostgresQueueStore, QueuePgPool};
