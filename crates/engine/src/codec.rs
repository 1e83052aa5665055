//! Event record codec
//!
//! Converts between the in-memory [`Event`] and the stored [`Item`]:
//!
//! | Attribute        | Stored as                                   |
//! |------------------|---------------------------------------------|
//! | `aggregate_id`   | String, hyphenated UUID (partition key)     |
//! | `version`        | Int, starting at 1 (sort key)               |
//! | `event_type`     | String                                      |
//! | `data`           | payload value, absent when there is none    |
//! | `timestamp`      | String, RFC 3339 UTC with nanoseconds       |
//! | `aggregate_type` | String                                      |
//! | `metadata`       | Object                                      |
//!
//! Decoding never fails because a type tag is unknown: the payload of an
//! unregistered type is kept as [`EventPayload::Undecoded`].

use crate::error::{EventStoreError, Operation};
use chrono::{DateTime, SecondsFormat, Utc};
use eventkeel_core::{
    AggregateId, AggregateType, Event, EventPayload, EventRegistry, EventType, Metadata, Value,
};
use eventkeel_storage::{Item, Key, KeySchema};
use thiserror::Error;

/// Partition key attribute
pub const AGGREGATE_ID: &str = "aggregate_id";
/// Sort key attribute
pub const VERSION: &str = "version";
/// Type tag attribute
pub const EVENT_TYPE: &str = "event_type";
/// Payload attribute
pub const DATA: &str = "data";
/// Timestamp attribute
pub const TIMESTAMP: &str = "timestamp";
/// Aggregate kind attribute
pub const AGGREGATE_TYPE: &str = "aggregate_type";
/// Metadata attribute
pub const METADATA: &str = "metadata";

/// Largest version a record can carry; the sort key is a signed Int
pub const MAX_VERSION: u64 = i64::MAX as u64;

/// Key schema of the events table
pub fn key_schema() -> KeySchema {
    KeySchema::new(AGGREGATE_ID, VERSION)
}

/// Codec failures
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload could not be serialized
    #[error("could not encode {event_type} payload of {aggregate_id}@{version}")]
    Encode {
        /// Aggregate of the event
        aggregate_id: AggregateId,
        /// Version of the event
        version: u64,
        /// Type tag
        event_type: EventType,
        /// Serializer error
        #[source]
        source: serde_json::Error,
    },

    /// A registered decoder rejected the payload
    #[error("could not decode {event_type} payload of {aggregate_id}@{version}")]
    Decode {
        /// Aggregate of the event
        aggregate_id: AggregateId,
        /// Version of the event
        version: u64,
        /// Type tag
        event_type: EventType,
        /// Decoder error
        #[source]
        source: serde_json::Error,
    },

    /// The version does not fit the sort key
    #[error("version {version} of {aggregate_id} exceeds the largest storable version")]
    VersionOutOfRange {
        /// Aggregate of the event
        aggregate_id: AggregateId,
        /// Offending version
        version: u64,
    },

    /// The stored item is not a valid event record
    #[error("malformed event record: {0}")]
    Malformed(String),
}

impl CodecError {
    /// Attach the failing operation
    pub fn into_store_error(self, op: Operation) -> EventStoreError {
        self.into_store_error_at(op, None)
    }

    /// Attach the failing operation and the version the caller expected
    pub fn into_store_error_at(self, op: Operation, expected_version: Option<u64>) -> EventStoreError {
        match self {
            CodecError::Encode {
                aggregate_id,
                version,
                event_type,
                source,
            } => EventStoreError::PayloadEncoding {
                op,
                aggregate_id,
                version,
                event_type,
                expected_version,
                source,
            },
            CodecError::Decode {
                aggregate_id,
                version,
                event_type,
                source,
            } => EventStoreError::PayloadDecoding {
                op,
                aggregate_id,
                version,
                event_type,
                source,
            },
            e @ CodecError::VersionOutOfRange { .. } => EventStoreError::MalformedRecord {
                op,
                reason: e.to_string(),
            },
            CodecError::Malformed(reason) => EventStoreError::MalformedRecord { op, reason },
        }
    }
}

/// An event as stored
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Owning aggregate
    pub aggregate_id: AggregateId,
    /// Position in the aggregate's stream
    pub version: u64,
    /// Type tag
    pub event_type: EventType,
    /// Serialized payload, `None` when the event has none
    pub data: Option<Value>,
    /// When the event was produced
    pub timestamp: DateTime<Utc>,
    /// Kind of the owning aggregate
    pub aggregate_type: AggregateType,
    /// Free-form metadata
    pub metadata: Metadata,
}

impl EventRecord {
    /// Primary key of the record
    pub fn key(&self) -> Key {
        Key::new(self.aggregate_id.to_string(), self.version)
    }

    /// Convert into a store item
    ///
    /// Fails with `VersionOutOfRange` above [`MAX_VERSION`].
    pub fn into_item(self) -> Result<Item, CodecError> {
        let version = i64::try_from(self.version).map_err(|_| CodecError::VersionOutOfRange {
            aggregate_id: self.aggregate_id,
            version: self.version,
        })?;

        let mut item = Item::with_capacity(7);
        item.insert(AGGREGATE_ID.into(), Value::String(self.aggregate_id.to_string()));
        item.insert(VERSION.into(), Value::Int(version));
        item.insert(EVENT_TYPE.into(), Value::String(self.event_type.as_str().into()));
        if let Some(data) = self.data {
            item.insert(DATA.into(), data);
        }
        item.insert(
            TIMESTAMP.into(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)),
        );
        item.insert(
            AGGREGATE_TYPE.into(),
            Value::String(self.aggregate_type.as_str().into()),
        );
        item.insert(METADATA.into(), Value::Object(self.metadata));
        Ok(item)
    }

    /// Parse a store item
    ///
    /// A missing `metadata` attribute reads as empty metadata.
    pub fn from_item(mut item: Item) -> Result<Self, CodecError> {
        let aggregate_id = take_string(&mut item, AGGREGATE_ID)?;
        let aggregate_id = aggregate_id.parse::<AggregateId>().map_err(|e| {
            CodecError::Malformed(format!("{} {:?} is not a UUID: {}", AGGREGATE_ID, aggregate_id, e))
        })?;

        let version = match item.remove(VERSION) {
            Some(Value::Int(v)) if v >= 1 => v as u64,
            Some(other) => {
                return Err(CodecError::Malformed(format!(
                    "{} must be a positive Int, got {:?}",
                    VERSION, other
                )))
            }
            None => return Err(missing(VERSION)),
        };

        let event_type = EventType::new(take_string(&mut item, EVENT_TYPE)?);
        let aggregate_type = AggregateType::new(take_string(&mut item, AGGREGATE_TYPE)?);

        let timestamp = take_string(&mut item, TIMESTAMP)?;
        let timestamp = DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|e| {
                CodecError::Malformed(format!("{} {:?}: {}", TIMESTAMP, timestamp, e))
            })?
            .with_timezone(&Utc);

        let metadata = match item.remove(METADATA) {
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(CodecError::Malformed(format!(
                    "{} must be an Object, got {}",
                    METADATA,
                    other.type_name()
                )))
            }
            None => Metadata::new(),
        };

        Ok(EventRecord {
            aggregate_id,
            version,
            event_type,
            data: item.remove(DATA),
            timestamp,
            aggregate_type,
            metadata,
        })
    }
}

fn missing(attribute: &str) -> CodecError {
    CodecError::Malformed(format!("missing attribute {}", attribute))
}

fn take_string(item: &mut Item, attribute: &str) -> Result<String, CodecError> {
    match item.remove(attribute) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(CodecError::Malformed(format!(
            "{} must be a String, got {}",
            attribute,
            other.type_name()
        ))),
        None => Err(missing(attribute)),
    }
}

/// Build the stored record for an event
pub fn encode(event: &Event) -> Result<EventRecord, CodecError> {
    let data = event.payload.to_value().map_err(|source| CodecError::Encode {
        aggregate_id: event.aggregate_id,
        version: event.version,
        event_type: event.event_type.clone(),
        source,
    })?;

    Ok(EventRecord {
        aggregate_id: event.aggregate_id,
        version: event.version,
        event_type: event.event_type.clone(),
        data,
        timestamp: event.timestamp,
        aggregate_type: event.aggregate_type.clone(),
        metadata: event.metadata.clone(),
    })
}

/// Rebuild an event from its stored record
///
/// The payload is decoded with the decoder registered for the record's type
/// tag. Without one, the raw payload is kept as [`EventPayload::Undecoded`].
pub fn decode(record: EventRecord, registry: &EventRegistry) -> Result<Event, CodecError> {
    let payload = match record.data {
        None => EventPayload::None,
        Some(raw) => match registry.decode(&record.event_type, raw.clone()) {
            None => EventPayload::Undecoded(raw),
            Some(Ok(data)) => EventPayload::Decoded(data),
            Some(Err(source)) => {
                return Err(CodecError::Decode {
                    aggregate_id: record.aggregate_id,
                    version: record.version,
                    event_type: record.event_type,
                    source,
                })
            }
        },
    };

    Ok(Event {
        event_type: record.event_type,
        payload,
        timestamp: record.timestamp,
        aggregate_type: record.aggregate_type,
        aggregate_id: record.aggregate_id,
        version: record.version,
        metadata: record.metadata,
    })
}

/// Parse and decode a store item
pub fn decode_item(item: Item, registry: &EventRegistry) -> Result<Event, CodecError> {
    decode(EventRecord::from_item(item)?, registry)
}
