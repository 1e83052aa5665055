//! Convenient imports for eventkeel.
//!
//! ```
//! use eventkeel::prelude::*;
//!
//! let events = eventkeel::ephemeral()?;
//! let ctx = Context::background();
//! assert_eq!(events.current_version(&ctx, AggregateId::new())?, 0);
//! # Ok::<(), EventStoreError>(())
//! ```

// Main entry point
pub use crate::builder::EventStoreBuilder;
pub use eventkeel_engine::EventStore;

// Error handling
pub use eventkeel_engine::{EventStoreError, Result};

// Core types
pub use eventkeel_core::{
    AggregateId, AggregateType, Context, Event, EventPayload, EventRegistry, EventType, Value,
};

// Stores
pub use eventkeel_storage::{MemoryStore, StorageError, TableAdmin, TableStore};
