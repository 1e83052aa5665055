//! The event envelope
//!
//! An [`Event`] is a fixed envelope (type tag, aggregate identity, version,
//! timestamp, metadata) wrapping an [`EventPayload`]. The payload's concrete
//! shape is resolved at runtime through the [`EventRegistry`], never through
//! the envelope type itself.
//!
//! [`EventRegistry`]: crate::EventRegistry

use crate::types::{AggregateId, AggregateType, EventType};
use crate::value::{self, Value};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Free-form event metadata, not interpreted by the store
pub type Metadata = HashMap<String, Value>;

/// A typed event payload
///
/// Implemented automatically for every `Serialize + Clone + Debug + Send +
/// Sync + 'static` type. Types that should be decoded on load must also be
/// registered with an [`EventRegistry`](crate::EventRegistry).
pub trait EventData: fmt::Debug + Send + Sync + 'static {
    /// Serialize the payload into the storage attribute representation
    fn to_value(&self) -> Result<Value, serde_json::Error>;

    /// Clone into a new box
    fn clone_box(&self) -> Box<dyn EventData>;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;
}

impl<T> EventData for T
where
    T: Serialize + Clone + fmt::Debug + Send + Sync + 'static,
{
    fn to_value(&self) -> Result<Value, serde_json::Error> {
        value::to_value(self)
    }

    fn clone_box(&self) -> Box<dyn EventData> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Clone for Box<dyn EventData> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Payload carried by an event
#[derive(Debug, Clone, Default)]
pub enum EventPayload {
    /// The event has no payload
    #[default]
    None,
    /// Payload decoded into its registered type
    Decoded(Box<dyn EventData>),
    /// Stored payload whose type tag has no registered decoder in this
    /// process; kept verbatim so it can be written back unchanged
    Undecoded(Value),
}

impl EventPayload {
    /// Check if there is no payload
    pub fn is_none(&self) -> bool {
        matches!(self, EventPayload::None)
    }

    /// Check if the payload was left undecoded
    pub fn is_undecoded(&self) -> bool {
        matches!(self, EventPayload::Undecoded(_))
    }

    /// The decoded payload, if any
    pub fn decoded(&self) -> Option<&dyn EventData> {
        match self {
            EventPayload::Decoded(data) => Some(data.as_ref()),
            _ => None,
        }
    }

    /// The raw stored payload of an undecoded event
    pub fn raw(&self) -> Option<&Value> {
        match self {
            EventPayload::Undecoded(raw) => Some(raw),
            _ => None,
        }
    }

    /// Storage representation of the payload (`None` when there is none)
    pub fn to_value(&self) -> Result<Option<Value>, serde_json::Error> {
        match self {
            EventPayload::None => Ok(None),
            EventPayload::Decoded(data) => data.to_value().map(Some),
            EventPayload::Undecoded(raw) => Ok(Some(raw.clone())),
        }
    }
}

impl PartialEq for EventPayload {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (EventPayload::None, EventPayload::None) => true,
            (EventPayload::Undecoded(a), EventPayload::Undecoded(b)) => a == b,
            (EventPayload::Decoded(a), EventPayload::Decoded(b)) => {
                match (a.to_value(), b.to_value()) {
                    (Ok(a), Ok(b)) => a == b,
                    _ => false,
                }
            }
            _ => false,
        }
    }
}

/// A domain event
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use eventkeel_core::{AggregateId, Event, Value};
/// use serde::Serialize;
///
/// #[derive(Debug, Clone, Serialize)]
/// struct Deposited {
///     amount: i64,
/// }
///
/// let id = AggregateId::new();
/// let event = Event::new("Deposited", Deposited { amount: 10 }, Utc::now(), "Account", id, 1)
///     .with_metadata("user", Value::from("ada"));
///
/// assert_eq!(event.to_string(), "Deposited@1");
/// assert_eq!(event.data_as::<Deposited>().map(|d| d.amount), Some(10));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Type tag of the payload
    pub event_type: EventType,
    /// Payload
    pub payload: EventPayload,
    /// When the event was produced (caller-supplied)
    pub timestamp: DateTime<Utc>,
    /// Kind of the owning aggregate
    pub aggregate_type: AggregateType,
    /// Identity of the owning aggregate
    pub aggregate_id: AggregateId,
    /// Position in the aggregate's stream, starting at 1
    pub version: u64,
    /// Free-form metadata
    pub metadata: Metadata,
}

impl Event {
    /// Create an event carrying a typed payload
    pub fn new(
        event_type: impl Into<EventType>,
        data: impl EventData,
        timestamp: DateTime<Utc>,
        aggregate_type: impl Into<AggregateType>,
        aggregate_id: AggregateId,
        version: u64,
    ) -> Self {
        Self::with_payload(
            event_type,
            EventPayload::Decoded(Box::new(data)),
            timestamp,
            aggregate_type,
            aggregate_id,
            version,
        )
    }

    /// Create an event without a payload
    pub fn without_data(
        event_type: impl Into<EventType>,
        timestamp: DateTime<Utc>,
        aggregate_type: impl Into<AggregateType>,
        aggregate_id: AggregateId,
        version: u64,
    ) -> Self {
        Self::with_payload(
            event_type,
            EventPayload::None,
            timestamp,
            aggregate_type,
            aggregate_id,
            version,
        )
    }

    /// Create an event from an explicit payload
    pub fn with_payload(
        event_type: impl Into<EventType>,
        payload: EventPayload,
        timestamp: DateTime<Utc>,
        aggregate_type: impl Into<AggregateType>,
        aggregate_id: AggregateId,
        version: u64,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            timestamp,
            aggregate_type: aggregate_type.into(),
            aggregate_id,
            version,
            metadata: Metadata::new(),
        }
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The decoded payload, if the event has one and its type is registered
    pub fn data(&self) -> Option<&dyn EventData> {
        self.payload.decoded()
    }

    /// Downcast the decoded payload to a concrete type
    pub fn data_as<T: EventData>(&self) -> Option<&T> {
        self.data().and_then(|d| d.as_any().downcast_ref::<T>())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.event_type, self.version)
    }
}
