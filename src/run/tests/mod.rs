//! Unit tests for the run module.
//!
//! Tests cover the lifecycle state machine and the orchestration service,
//! including admission control and deferred promotion.

mod lifecycle_tests;
