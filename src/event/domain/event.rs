//! Event records ingested by the dispatch pipeline.

use super::{EventDomainError, EventId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Wire name of events synthesized from schedule ticks.
pub const SCHEDULED_EVENT_NAME: &str = "dev.trigger.scheduled";

/// One ingested external or internal event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    id: EventId,
    name: String,
    source: String,
    payload: Value,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EventRecord {
    /// Creates an undelivered event record.
    ///
    /// # Errors
    ///
    /// Returns [`EventDomainError::EmptyEventName`] when the name is blank.
    pub fn new(
        id: EventId,
        name: impl Into<String>,
        source: impl Into<String>,
        payload: Value,
        clock: &impl Clock,
    ) -> Result<Self, EventDomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(EventDomainError::EmptyEventName);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id,
            name,
            source: source.into(),
            payload,
            delivered_at: None,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Returns the event identifier.
    #[must_use]
    pub fn id(&self) -> &EventId {
        &self.id
    }

    /// Returns the event name dispatchers match against.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the source label the event arrived from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the raw event payload.
    #[must_use]
    pub const fn payload(&self) -> &Value {
        &self.payload
    }

    /// Returns when the event was fanned out, when it has been.
    #[must_use]
    pub const fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Marks the event as fanned out to its dispatchers.
    pub fn mark_delivered(&mut self, clock: &impl Clock) {
        let timestamp = clock.utc();
        self.delivered_at = Some(timestamp);
        self.updated_at = timestamp;
    }
}

/// Timer payload carried by scheduled deliveries.
///
/// `last_timestamp` carries the previous fire so handlers can compute
/// elapsed-interval semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledPayload {
    /// Timestamp of the tick that fired.
    pub ts: DateTime<Utc>,
    /// Timestamp of the previous tick, absent on the first fire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_timestamp: Option<DateTime<Utc>>,
}
