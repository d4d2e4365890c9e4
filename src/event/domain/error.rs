//! Error types for event domain validation.

use super::DispatcherId;
use thiserror::Error;

/// Errors returned while constructing or using event domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EventDomainError {
    /// An event name was empty after trimming.
    #[error("event name must not be empty")]
    EmptyEventName,

    /// A dispatcher slug was empty after trimming.
    #[error("dispatcher slug must not be empty")]
    EmptyDispatcherSlug,

    /// A scheduled delivery targeted a dispatcher that is not a schedule.
    #[error("dispatcher {0} is not a schedule")]
    NotASchedule(DispatcherId),

    /// An interval schedule was outside the supported range.
    #[error("interval of {0}s is outside the supported range of 60..=86400")]
    IntervalOutOfRange(u32),
}
