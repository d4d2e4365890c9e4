//! Durable, schema-typed task queue.
//!
//! Work enters through [`services::EnqueueService`], which validates a
//! payload against its kind's schema, routes it to a named queue via the
//! task catalog, and persists it through a [`ports::QueueStore`]. A
//! [`services::WorkerPool`] claims eligible instances under per-queue
//! exclusivity, executes the registered handler, and records the outcome
//! with bounded, backoff-spaced retries. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
