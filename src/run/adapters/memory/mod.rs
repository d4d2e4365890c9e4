//! In-memory adapters for run persistence and settings.

mod repository;
mod settings;

pub use repository::InMemoryRunRepository;
pub use settings::InMemoryJobSettings;
