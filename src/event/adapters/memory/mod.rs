//! In-memory adapters for event, dispatcher, and source persistence.

mod dispatchers;
mod events;
mod sources;

pub use dispatchers::InMemoryDispatcherRepository;
pub use events::InMemoryEventRepository;
pub use sources::InMemorySourceRepository;
