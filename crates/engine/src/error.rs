//! Event store error types
//!
//! Every failure the engine reports is an [`EventStoreError`]. Variants carry
//! the [`Operation`] that failed and, where it is known, the aggregate and
//! the version the caller expected, so a caller can decide whether to reload
//! and retry without parsing messages.

use eventkeel_core::{AggregateId, AggregateType, EventType};
use eventkeel_storage::StorageError;
use std::fmt;
use thiserror::Error;

/// The engine operation an error was raised by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Appending events
    Save,
    /// Loading one aggregate
    Load,
    /// Loading every event
    LoadAll,
    /// Replacing one stored event
    Replace,
    /// Renaming an event type across history
    Rename,
    /// Creating the events table
    CreateTable,
    /// Deleting the events table
    DeleteTable,
    /// Checking whether the events table exists
    DescribeTable,
}

impl Operation {
    /// Short lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Save => "save",
            Operation::Load => "load",
            Operation::LoadAll => "load_all",
            Operation::Replace => "replace",
            Operation::Rename => "rename",
            Operation::CreateTable => "create_table",
            Operation::DeleteTable => "delete_table",
            Operation::DescribeTable => "describe_table",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by [`EventStore`](crate::EventStore)
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The batch to append was empty
    #[error("{op}: no events to save")]
    NoEvents {
        /// Failing operation
        op: Operation,
    },

    /// A batch event belongs to a different aggregate than the first one
    #[error("{op}: event {version} belongs to aggregate {found}, batch is for {expected}")]
    MismatchedAggregate {
        /// Failing operation
        op: Operation,
        /// Aggregate of the first event
        expected: AggregateId,
        /// Aggregate of the offending event
        found: AggregateId,
        /// Version of the offending event
        version: u64,
        /// Version the caller expected, for appends
        expected_version: Option<u64>,
    },

    /// A batch event does not carry the next version in sequence
    #[error(
        "{op}: aggregate {aggregate_id} expected version {expected_version}, \
         event at index {index} has version {found}, wanted {}",
        .wanted.map_or_else(|| "none (past the last storable version)".to_string(), |w| w.to_string())
    )]
    IncorrectVersion {
        /// Failing operation
        op: Operation,
        /// Aggregate being appended to
        aggregate_id: AggregateId,
        /// Version the caller believes is current
        expected_version: u64,
        /// Position of the offending event in the batch
        index: usize,
        /// Version the event should carry, `None` when the slot would lie
        /// past the last storable version
        wanted: Option<u64>,
        /// Version the event carries
        found: u64,
    },

    /// Another writer already stored an event at this version
    #[error(
        "{op}: concurrency conflict on {aggregate_type} {aggregate_id}: \
         version {version} already exists (expected version {expected_version})"
    )]
    ConcurrencyConflict {
        /// Failing operation
        op: Operation,
        /// Aggregate being appended to
        aggregate_id: AggregateId,
        /// Kind of the aggregate
        aggregate_type: AggregateType,
        /// Version the caller believed was current
        expected_version: u64,
        /// Occupied version slot
        version: u64,
    },

    /// The event to replace does not exist
    #[error("{op}: aggregate {aggregate_id} has no event at version {version}")]
    MissingEvent {
        /// Failing operation
        op: Operation,
        /// Aggregate of the event
        aggregate_id: AggregateId,
        /// Missing version
        version: u64,
    },

    /// The aggregate has no events at all
    #[error("{op}: aggregate {aggregate_id} not found")]
    AggregateNotFound {
        /// Failing operation
        op: Operation,
        /// Missing aggregate
        aggregate_id: AggregateId,
    },

    /// A payload could not be serialized
    #[error("{op}: could not encode {event_type} payload of {aggregate_id}@{version}")]
    PayloadEncoding {
        /// Failing operation
        op: Operation,
        /// Aggregate of the event
        aggregate_id: AggregateId,
        /// Version of the event
        version: u64,
        /// Type tag of the payload
        event_type: EventType,
        /// Version the caller expected, for appends
        expected_version: Option<u64>,
        /// Serializer error
        #[source]
        source: serde_json::Error,
    },

    /// A registered decoder rejected a stored payload
    #[error("{op}: could not decode {event_type} payload of {aggregate_id}@{version}")]
    PayloadDecoding {
        /// Failing operation
        op: Operation,
        /// Aggregate of the event
        aggregate_id: AggregateId,
        /// Version of the event
        version: u64,
        /// Type tag of the payload
        event_type: EventType,
        /// Decoder error
        #[source]
        source: serde_json::Error,
    },

    /// A stored record is missing an attribute or has one of the wrong type
    #[error("{op}: malformed event record: {reason}")]
    MalformedRecord {
        /// Failing operation
        op: Operation,
        /// What was wrong
        reason: String,
    },

    /// The store failed the request
    #[error("{op}: storage error: {source}")]
    Storage {
        /// Failing operation
        op: Operation,
        /// Aggregate involved, if any
        aggregate_id: Option<AggregateId>,
        /// Expected version, for appends
        expected_version: Option<u64>,
        /// Underlying store error
        #[source]
        source: StorageError,
    },

    /// The store configuration is unusable
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for event store operations
pub type Result<T> = std::result::Result<T, EventStoreError>;

impl EventStoreError {
    /// Wrap a store failure that is not tied to one aggregate
    pub(crate) fn storage(op: Operation, source: StorageError) -> Self {
        EventStoreError::Storage {
            op,
            aggregate_id: None,
            expected_version: None,
            source,
        }
    }

    /// Wrap a store failure on one aggregate
    pub(crate) fn storage_for(
        op: Operation,
        aggregate_id: AggregateId,
        expected_version: Option<u64>,
        source: StorageError,
    ) -> Self {
        EventStoreError::Storage {
            op,
            aggregate_id: Some(aggregate_id),
            expected_version,
            source,
        }
    }

    /// The operation that failed, if the error was raised by one
    pub fn operation(&self) -> Option<Operation> {
        match self {
            EventStoreError::NoEvents { op }
            | EventStoreError::MismatchedAggregate { op, .. }
            | EventStoreError::IncorrectVersion { op, .. }
            | EventStoreError::ConcurrencyConflict { op, .. }
            | EventStoreError::MissingEvent { op, .. }
            | EventStoreError::AggregateNotFound { op, .. }
            | EventStoreError::PayloadEncoding { op, .. }
            | EventStoreError::PayloadDecoding { op, .. }
            | EventStoreError::MalformedRecord { op, .. }
            | EventStoreError::Storage { op, .. } => Some(*op),
            EventStoreError::InvalidConfig(_) => None,
        }
    }

    /// The aggregate involved, if known
    pub fn aggregate_id(&self) -> Option<AggregateId> {
        match self {
            EventStoreError::MismatchedAggregate { expected, .. } => Some(*expected),
            EventStoreError::IncorrectVersion { aggregate_id, .. }
            | EventStoreError::ConcurrencyConflict { aggregate_id, .. }
            | EventStoreError::MissingEvent { aggregate_id, .. }
            | EventStoreError::AggregateNotFound { aggregate_id, .. }
            | EventStoreError::PayloadEncoding { aggregate_id, .. }
            | EventStoreError::PayloadDecoding { aggregate_id, .. } => Some(*aggregate_id),
            EventStoreError::Storage { aggregate_id, .. } => *aggregate_id,
            _ => None,
        }
    }

    /// The version the caller expected, if the operation had one
    pub fn expected_version(&self) -> Option<u64> {
        match self {
            EventStoreError::IncorrectVersion {
                expected_version, ..
            }
            | EventStoreError::ConcurrencyConflict {
                expected_version, ..
            } => Some(*expected_version),
            EventStoreError::MismatchedAggregate {
                expected_version, ..
            }
            | EventStoreError::PayloadEncoding {
                expected_version, ..
            }
            | EventStoreError::Storage {
                expected_version, ..
            } => *expected_version,
            _ => None,
        }
    }

    /// Check if the caller's input was rejected before any I/O
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            EventStoreError::NoEvents { .. }
                | EventStoreError::MismatchedAggregate { .. }
                | EventStoreError::IncorrectVersion { .. }
        )
    }

    /// Check if this is a write conflict
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            EventStoreError::ConcurrencyConflict { .. } | EventStoreError::MissingEvent { .. }
        )
    }

    /// Check if this error is retryable
    ///
    /// Only concurrency conflicts are: reload the aggregate, re-apply the
    /// command, and append again at the new version.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EventStoreError::ConcurrencyConflict { .. })
    }

    /// The underlying store error, for `Storage` failures
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            EventStoreError::Storage { source, .. } => Some(source),
            _ => None,
        }
    }
}
