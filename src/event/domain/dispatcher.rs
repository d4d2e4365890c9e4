//! Dispatcher registrations matching events and timer ticks to jobs.

use super::{DispatcherId, EndpointId, EventDomainError};
use crate::run::domain::JobId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Schedule description for time-based dispatchers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleMetadata {
    /// Fires every `seconds` seconds.
    Interval {
        /// Interval length in seconds, 60 to 86400 inclusive.
        seconds: u32,
    },
    /// Fires according to a cron expression.
    Cron {
        /// Cron expression in standard five-field syntax.
        expression: String,
    },
}

impl ScheduleMetadata {
    /// Creates a validated interval schedule.
    ///
    /// # Errors
    ///
    /// Returns [`EventDomainError::IntervalOutOfRange`] when `seconds` is
    /// outside 60..=86400 (the range the registration API accepts).
    pub const fn interval(seconds: u32) -> Result<Self, EventDomainError> {
        if seconds < 60 || seconds > 86_400 {
            return Err(EventDomainError::IntervalOutOfRange(seconds));
        }
        Ok(Self::Interval { seconds })
    }
}

/// What a dispatcher reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Dispatchable {
    /// Reacts to ingested events carrying the given name.
    Trigger {
        /// Event name the trigger listens for.
        event_name: String,
    },
    /// Reacts to timer ticks of the given schedule.
    Schedule {
        /// Schedule driving the dispatcher.
        schedule: ScheduleMetadata,
    },
}

/// One job version registered against a dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRegistration {
    /// Job started when the dispatcher fires.
    pub id: JobId,
    /// Registered job version.
    pub version: String,
}

/// A registered trigger or schedule owned by a deployed endpoint.
///
/// Dispatchers are keyed idempotently by `(endpoint, slug)`: re-registering
/// the same slug updates the registration in place and keeps the identifier
/// stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dispatcher {
    id: DispatcherId,
    endpoint_id: EndpointId,
    slug: String,
    dispatchable: Dispatchable,
    jobs: Vec<JobRegistration>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Dispatcher {
    /// Creates a dispatcher registration.
    ///
    /// # Errors
    ///
    /// Returns [`EventDomainError::EmptyDispatcherSlug`] when the slug is
    /// blank.
    pub fn new(
        id: DispatcherId,
        endpoint_id: EndpointId,
        slug: impl Into<String>,
        dispatchable: Dispatchable,
        jobs: Vec<JobRegistration>,
        clock: &impl Clock,
    ) -> Result<Self, EventDomainError> {
        let slug = slug.into();
        if slug.trim().is_empty() {
            return Err(EventDomainError::EmptyDispatcherSlug);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id,
            endpoint_id,
            slug,
            dispatchable,
            jobs,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Returns the dispatcher identifier.
    #[must_use]
    pub fn id(&self) -> &DispatcherId {
        &self.id
    }

    /// Returns the owning endpoint identifier.
    #[must_use]
    pub fn endpoint_id(&self) -> &EndpointId {
        &self.endpoint_id
    }

    /// Returns the registration slug, unique per endpoint.
    #[must_use]
    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Returns what the dispatcher reacts to.
    #[must_use]
    pub const fn dispatchable(&self) -> &Dispatchable {
        &self.dispatchable
    }

    /// Returns the job versions registered against the dispatcher.
    #[must_use]
    pub fn jobs(&self) -> &[JobRegistration] {
        &self.jobs
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns `true` when the dispatcher is a trigger listening for the
    /// given event name.
    #[must_use]
    pub fn matches_event(&self, event_name: &str) -> bool {
        match &self.dispatchable {
            Dispatchable::Trigger { event_name: listened } => listened == event_name,
            Dispatchable::Schedule { .. } => false,
        }
    }

    /// Returns the schedule when the dispatcher is time-based.
    ///
    /// # Errors
    ///
    /// Returns [`EventDomainError::NotASchedule`] for trigger dispatchers.
    pub fn schedule(&self) -> Result<&ScheduleMetadata, EventDomainError> {
        match &self.dispatchable {
            Dispatchable::Schedule { schedule } => Ok(schedule),
            Dispatchable::Trigger { .. } => {
                Err(EventDomainError::NotASchedule(self.id.clone()))
            }
        }
    }

    /// Replaces the registration body while keeping identity and creation
    /// time, used by idempotent re-registration.
    pub fn update_registration(
        &mut self,
        dispatchable: Dispatchable,
        jobs: Vec<JobRegistration>,
        clock: &impl Clock,
    ) {
        self.dispatchable = dispatchable;
        self.jobs = jobs;
        self.updated_at = clock.utc();
    }
}

/// Registration payload for a dynamic trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicTriggerMetadata {
    /// Registration slug, unique per endpoint.
    pub id: String,
    /// Event name the trigger listens for.
    pub event_name: String,
    /// Job versions to start when the trigger fires.
    pub jobs: Vec<JobRegistration>,
}

/// Registration payload for a dynamic schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicScheduleMetadata {
    /// Registration slug, unique per endpoint.
    pub id: String,
    /// Schedule driving the dispatcher.
    pub schedule: ScheduleMetadata,
    /// Job versions to start when the schedule fires.
    pub jobs: Vec<JobRegistration>,
}
