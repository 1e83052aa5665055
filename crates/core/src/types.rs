//! Core identity types
//!
//! - [`AggregateId`]: unique identifier of an aggregate (partition key)
//! - [`AggregateType`]: kind of aggregate owning a stream of events
//! - [`EventType`]: type tag identifying an event payload's logical type

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for an aggregate
///
/// Every event record is partitioned by the id of the aggregate that
/// produced it. The string form (hyphenated UUID) is what gets stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AggregateId(Uuid);

impl AggregateId {
    /// Create a new random AggregateId using UUID v4
    ///
    /// # Examples
    ///
    /// ```
    /// use eventkeel_core::AggregateId;
    ///
    /// let a = AggregateId::new();
    /// let b = AggregateId::new();
    /// assert_ne!(a, b);
    /// ```
    pub fn new() -> Self {
        AggregateId(Uuid::new_v4())
    }

    /// Create AggregateId from raw bytes
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        AggregateId(Uuid::from_bytes(bytes))
    }

    /// Get raw bytes representation
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AggregateId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for AggregateId {
    fn from(uuid: Uuid) -> Self {
        AggregateId(uuid)
    }
}

impl fmt::Display for AggregateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AggregateId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(AggregateId)
    }
}

macro_rules! string_tag {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new tag
            pub fn new(tag: impl Into<String>) -> Self {
                $name(tag.into())
            }

            /// Borrow the tag as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Check if the tag is empty
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_tag! {
    /// Type tag of an event payload (e.g. `"AccountOpened"`)
    EventType
}

string_tag! {
    /// Kind of aggregate that owns an event stream (e.g. `"Account"`)
    AggregateType
}
