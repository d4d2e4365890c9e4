//! Unit tests for the event module.
//!
//! Tests cover the two-stage dispatch pipeline (fan-out and dispatcher
//! invocation), scheduled delivery, and idempotent dynamic registration.

mod dispatch_tests;
mod registration_tests;
