//! Identifier types for the event dispatch domain.
//!
//! Like run identifiers, these are opaque strings minted by the embedding
//! application and are never interpreted by the core.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from an opaque string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Unique identifier for an ingested event record.
    EventId
);

string_id!(
    /// Unique identifier for a registered dispatcher (trigger or schedule).
    DispatcherId
);

string_id!(
    /// Unique identifier for a deployed endpoint owning registrations.
    EndpointId
);

string_id!(
    /// Unique identifier for a registered ingestion source.
    SourceId
);
