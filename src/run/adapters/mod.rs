//! Adapter implementations of the run ports.

pub mod memory;
