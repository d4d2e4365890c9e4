//! Domain model for event ingestion and dispatch.
//!
//! Events, dispatchers, and sources are referenced by the queue's task
//! payloads but owned here; the dispatch pipeline reads registrations that
//! the dynamic registration tasks upsert.

mod dispatcher;
mod error;
mod event;
mod ids;
mod source;

pub use dispatcher::{
    Dispatchable, Dispatcher, DynamicScheduleMetadata, DynamicTriggerMetadata, JobRegistration,
    ScheduleMetadata,
};
pub use error::EventDomainError;
pub use event::{EventRecord, SCHEDULED_EVENT_NAME, ScheduledPayload};
pub use ids::{DispatcherId, EndpointId, EventId, SourceId};
pub use source::{Source, SourceChannel, SourceMetadata};
