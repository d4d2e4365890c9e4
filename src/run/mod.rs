//! Job-run orchestration.
//!
//! A run advances `Queued → Starting → Executing → {Completed, Failed}`,
//! each step driven by completion of a dedicated queue task. Admission
//! enforces per-job concurrency ceilings; runs deferred at the ceiling are
//! promoted oldest-first when a slot frees up. The module follows
//! hexagonal architecture:
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
