//! Conveyor: durable task queue and job-run orchestration.
//!
//! This crate provides a schema-typed task queue with per-queue execution
//! exclusivity, a worker pool with bounded retries and visibility
//! deadlines, a job-run lifecycle state machine, and an event dispatch
//! pipeline that fans ingested events out to registered dispatchers.
//!
//! # Architecture
//!
//! Conveyor follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, in-memory)
//!
//! # Modules
//!
//! - [`queue`]: Task catalog, durable queue store, and worker pool
//! - [`run`]: Job-run lifecycle and admission control
//! - [`event`]: Event ingestion, dispatch, and dynamic registration
//! - [`bootstrap`]: Assembly of the contexts into one running system

pub mod bootstrap;
pub mod event;
pub mod queue;
pub mod run;
