//! Event store engine for eventkeel
//!
//! This crate implements the append/read protocol of the event log on top of
//! any [`TableStore`](eventkeel_storage::TableStore):
//! - `codec`: event ⇄ stored record
//! - `append`: optimistic-concurrency append, one conditional put per event
//! - `reader`: strongly consistent loads
//! - `corrector`: in-place replace and event type rename
//! - `admin`: events table lifecycle
//!
//! # Appends are not atomic
//!
//! [`EventStore::append`] writes a batch event by event. If it fails partway,
//! the events before the failure stay committed. See the `append` module.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod admin;
mod append;
pub mod codec;
pub mod config;
mod corrector;
pub mod error;
mod reader;
mod store;


pub use codec::{CodecError, EventRecord};
pub use config::{EventStoreConfig, DEFAULT_TABLE_NAME};
pub use error::{EventStoreError, Operation, Result};
pub use store::EventStore;
