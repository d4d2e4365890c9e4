//! Unit tests for the queue module.
//!
//! Tests are organised by concept: catalog and routing, the instance
//! status machine, retry backoff, the in-memory claim protocol, and the
//! enqueue and registry services.

mod catalog_tests;
mod support;
