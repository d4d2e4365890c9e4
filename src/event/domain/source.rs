//! Ingestion source registrations.

use super::{EndpointId, SourceId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Delivery channel of an ingestion source, one variant per concrete
/// source type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceChannel {
    /// Webhook-style HTTP ingestion.
    Http {
        /// URL the external system delivers requests to.
        url: String,
    },
    /// Inbound mail ingestion.
    Smtp,
    /// Queue-polling ingestion.
    Sqs,
}

/// Source registration payload carried by the `registerSource` task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Source key, unique per endpoint.
    pub key: String,
    /// Delivery channel of the source.
    pub channel: SourceChannel,
}

/// A registered ingestion source owned by a deployed endpoint.
///
/// Sources are keyed idempotently by `(endpoint, key)` and start inactive;
/// activation is a separate task so orphaned events gathered before
/// activation can be re-delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    id: SourceId,
    endpoint_id: EndpointId,
    key: String,
    channel: SourceChannel,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Source {
    /// Creates an inactive source registration.
    #[must_use]
    pub fn new(
        id: SourceId,
        endpoint_id: EndpointId,
        metadata: SourceMetadata,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id,
            endpoint_id,
            key: metadata.key,
            channel: metadata.channel,
            active: false,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Returns the source identifier.
    #[must_use]
    pub fn id(&self) -> &SourceId {
        &self.id
    }

    /// Returns the owning endpoint identifier.
    #[must_use]
    pub fn endpoint_id(&self) -> &EndpointId {
        &self.endpoint_id
    }

    /// Returns the source key, unique per endpoint.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the delivery channel.
    #[must_use]
    pub const fn channel(&self) -> &SourceChannel {
        &self.channel
    }

    /// Returns `true` once the source has been activated.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the last update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Replaces the channel while keeping identity, used by idempotent
    /// re-registration.
    pub fn update_channel(&mut self, channel: SourceChannel, clock: &impl Clock) {
        self.channel = channel;
        self.updated_at = clock.utc();
    }

    /// Activates the source.
    pub fn activate(&mut self, clock: &impl Clock) {
        self.active = true;
        self.updated_at = clock.utc();
    }
}
