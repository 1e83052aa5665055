//! # eventkeel
//!
//! Append-only, per-aggregate event log over a key-value store with atomic
//! conditional writes.
//!
//! Each aggregate's events live in one partition ordered by version. Writers
//! claim a version with a conditional put that only succeeds if the slot is
//! empty, so two writers racing for the same version can never both win.
//! There are no in-process locks; the store arbitrates.
//!
//! ## Quick Start
//!
//! ```
//! use eventkeel::prelude::*;
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Deposited {
//!     amount: i64,
//! }
//!
//! let registry = Arc::new(EventRegistry::new());
//! registry.register::<Deposited>("Deposited").unwrap();
//!
//! let events = EventStoreBuilder::new().registry(registry).ephemeral()?;
//! let ctx = Context::background();
//! let id = AggregateId::new();
//!
//! let deposit = Event::new("Deposited", Deposited { amount: 10 }, chrono::Utc::now(), "Account", id, 1);
//! events.append(&ctx, &[deposit], 0)?;
//!
//! let history = events.load_aggregate(&ctx, id)?;
//! assert_eq!(history[0].data_as::<Deposited>().map(|d| d.amount), Some(10));
//! # Ok::<(), eventkeel::EventStoreError>(())
//! ```
//!
//! ## Appends are not atomic
//!
//! [`EventStore::append`] writes a batch one event at a time. If event `k`
//! of a batch fails (a concurrent writer took its version, the store failed,
//! or the context expired), events before `k` stay committed and are never
//! rolled back. Recover with [`EventStore::current_version`] and append the
//! remaining suffix.
//!
//! ## Crates
//!
//! - `eventkeel-core`: [`Event`], [`Value`], [`EventRegistry`], [`Context`]
//! - `eventkeel-storage`: [`TableStore`], [`TableAdmin`], [`MemoryStore`]
//! - `eventkeel-engine`: [`EventStore`] and its errors

#![warn(missing_docs)]

mod builder;

pub mod prelude;

// Re-export main entry points
pub use builder::{ephemeral, EventStoreBuilder};
pub use eventkeel_engine::{
    codec, CodecError, EventRecord, EventStore, EventStoreConfig, EventStoreError, Operation,
    Result, DEFAULT_TABLE_NAME,
};

// Re-export core types
pub use eventkeel_core::{
    from_value, to_value, AggregateId, AggregateType, Context, ContextError, Event, EventData,
    EventPayload, EventRegistry, EventType, Metadata, RegistryError, Value,
};

// Re-export storage
pub use eventkeel_storage::{
    Condition, Item, Key, KeySchema, MemoryStore, ReadConsistency, StorageError, StorageResult,
    TableAdmin, TableDescription, TableStore, UpdateExpression,
};
