//! Event ingestion, dispatch, and dynamic registration.
//!
//! Ingested events fan out to matching dispatchers, and each invoked
//! dispatcher starts one run per registered job. Schedule ticks deliver
//! straight to their dispatcher as synthesized scheduled events. The
//! module follows hexagonal architecture:
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
