//! Port contracts for event ingestion and dispatch.

pub mod dispatchers;
pub mod events;
pub mod sources;
pub mod starter;

pub use dispatchers::{DispatcherRepository, DispatcherRepositoryError, DispatcherRepositoryResult};
pub use events::{EventRepository, EventRepositoryError, EventRepositoryResult};
pub use sources::{SourceRepository, SourceRepositoryError, SourceRepositoryResult};
pub use starter::{RunStarter, RunStarterError, RunStarterResult};
