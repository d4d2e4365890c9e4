//! Port contracts for the job-run lifecycle.

pub mod executor;
pub mod observer;
pub mod repository;
pub mod settings;

pub use executor::{RunExecutor, RunExecutorError, RunExecutorResult};
pub use observer::{NullRunObserver, RunObserver};
pub use repository::{RunRepository, RunRepositoryError, RunRepositoryResult};
pub use settings::{JobSettings, JobSettingsError, JobSettingsResult};
