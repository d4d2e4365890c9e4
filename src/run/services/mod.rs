//! Application services for run lifecycle orchestration.

mod handlers;
mod lifecycle;

pub use handlers::RunTaskHandler;
pub use lifecycle::{RunLifecycleError, RunLifecycleResult, RunLifecycleService};
