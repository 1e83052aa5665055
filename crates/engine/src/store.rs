//! The event store handle
//!
//! [`EventStore`] binds a table store, an event registry, and a
//! configuration. It holds no per-aggregate state and no locks: every
//! operation goes straight to the store, and concurrent writers are
//! arbitrated by the store's per-key conditional writes.
//!
//! The operations live next to their concerns:
//! - `append`: optimistic-concurrency write path
//! - `reader`: strongly consistent loads
//! - `corrector`: in-place replace and type rename
//! - `admin`: table lifecycle

use crate::config::EventStoreConfig;
use crate::error::Result;
use eventkeel_core::{Context, EventRegistry};
use std::sync::Arc;

/// Append-only per-aggregate event log over a [`TableStore`]
///
/// Cheap to clone; clones share the store and registry.
///
/// [`TableStore`]: eventkeel_storage::TableStore
pub struct EventStore<S> {
    pub(crate) store: Arc<S>,
    pub(crate) registry: Arc<EventRegistry>,
    pub(crate) config: EventStoreConfig,
}

impl<S> EventStore<S> {
    /// Create an event store with the default configuration
    pub fn new(store: Arc<S>, registry: Arc<EventRegistry>) -> Self {
        Self {
            store,
            registry,
            config: EventStoreConfig::default(),
        }
    }

    /// Create an event store with an explicit configuration
    ///
    /// Fails with `InvalidConfig` if the configuration does not validate.
    pub fn with_config(
        store: Arc<S>,
        registry: Arc<EventRegistry>,
        config: EventStoreConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            registry,
            config,
        })
    }

    /// The underlying table store
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The registry used to decode payloads
    pub fn registry(&self) -> &Arc<EventRegistry> {
        &self.registry
    }

    /// The active configuration
    pub fn config(&self) -> &EventStoreConfig {
        &self.config
    }

    /// Name of the events table
    pub fn table_name(&self) -> &str {
        &self.config.table_name
    }

    /// Context for one operation: the caller's, narrowed by the
    /// configured operation timeout
    pub(crate) fn op_context(&self, ctx: &Context) -> Context {
        match self.config.operation_timeout {
            Some(timeout) => ctx.child_with_timeout(timeout),
            None => ctx.clone(),
        }
    }
}

impl<S> Clone for EventStore<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
        }
    }
}

impl<S> std::fmt::Debug for EventStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStore")
            .field("table_name", &self.config.table_name)
            .field("operation_timeout", &self.config.operation_timeout)
            .field("registry", &self.registry)
            .finish()
    }
}
