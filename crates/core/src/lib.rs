//! Core types for eventkeel
//!
//! This crate defines the types shared by every layer:
//! - [`Value`]: attribute representation used at the storage boundary
//! - [`AggregateId`], [`AggregateType`], [`EventType`]: identity and tags
//! - [`Event`], [`EventPayload`], [`EventData`]: the event envelope
//! - [`EventRegistry`]: type tag to payload decoder table
//! - [`Context`]: deadline and cancellation for store calls

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod event;
pub mod registry;
pub mod types;
pub mod value;

pub use context::{Context, ContextError};
pub use event::{Event, EventData, EventPayload, Metadata};
pub use registry::{EventRegistry, RegistryError};
pub use types::{AggregateId, AggregateType, EventType};
pub use value::{from_value, to_value, SpecialFloatKind, Value};
