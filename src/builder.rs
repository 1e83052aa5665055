//! Event store construction.
//!
//! This module provides [`EventStoreBuilder`], the entry point for opening
//! an [`EventStore`] over a table store with a given configuration.

use crate::Result;
use eventkeel_core::{Context, EventRegistry};
use eventkeel_engine::{EventStore, EventStoreConfig};
use eventkeel_storage::{MemoryStore, TableAdmin, TableStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Builder for event store configuration.
///
/// # Example
///
/// ```
/// use eventkeel::prelude::*;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let ctx = Context::background();
///
/// // Shared store, table created on first open
/// let store = Arc::new(MemoryStore::new());
/// let events = EventStoreBuilder::new()
///     .table_name("orders_events")
///     .operation_timeout(Duration::from_secs(5))
///     .create_table_if_missing(true)
///     .open(&ctx, store)?;
/// assert_eq!(events.table_name(), "orders_events");
///
/// // Unit testing: private in-memory store
/// let scratch = EventStoreBuilder::new().ephemeral()?;
/// assert!(scratch.table_exists(&ctx)?);
/// # Ok::<(), eventkeel::EventStoreError>(())
/// ```
#[derive(Debug, Default)]
pub struct EventStoreBuilder {
    config: EventStoreConfig,
    registry: Option<Arc<EventRegistry>>,
    create_table_if_missing: bool,
}

impl EventStoreBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the events table name.
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.with_table_name(name);
        self
    }

    /// Bound every operation by `timeout`, in addition to the caller's
    /// context deadline.
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.with_operation_timeout(timeout);
        self
    }

    /// Use `registry` to decode payloads.
    ///
    /// Without one, the store starts with an empty registry and every
    /// payload loads undecoded.
    pub fn registry(mut self, registry: Arc<EventRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Create the events table on open if it does not exist.
    pub fn create_table_if_missing(mut self, create: bool) -> Self {
        self.create_table_if_missing = create;
        self
    }

    /// Open an event store over `store`.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if the configuration does not validate
    /// - `Storage` if the table had to be created and creation failed
    pub fn open<S>(self, ctx: &Context, store: Arc<S>) -> Result<EventStore<S>>
    where
        S: TableStore + TableAdmin,
    {
        let registry = self.registry.unwrap_or_default();
        let events = EventStore::with_config(store, registry, self.config)?;
        if self.create_table_if_missing {
            events.ensure_table(ctx)?;
        }
        debug!(table = events.table_name(), "opened event store");
        Ok(events)
    }

    /// Open an event store over a private [`MemoryStore`], table created.
    pub fn ephemeral(self) -> Result<EventStore<MemoryStore>> {
        self.create_table_if_missing(true)
            .open(&Context::background(), Arc::new(MemoryStore::new()))
    }
}

/// Open an event store over a private [`MemoryStore`] with default settings.
///
/// # Example
///
/// ```
/// let events = eventkeel::ephemeral()?;
/// assert!(events.load_all(&eventkeel::Context::background())?.is_empty());
/// # Ok::<(), eventkeel::EventStoreError>(())
/// ```
pub fn ephemeral() -> Result<EventStore<MemoryStore>> {
    EventStoreBuilder::new().ephemeral()
}
