//! Event type registry
//!
//! Maps an [`EventType`] tag to a decoder that rebuilds the concrete payload
//! type from its stored [`Value`]. A tag without a decoder is not an error:
//! readers keep such payloads undecoded, which lets processes running
//! different code versions share one event table.

use crate::event::EventData;
use crate::types::EventType;
use crate::value::{self, Value};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;

type DecodeFn = dyn Fn(Value) -> Result<Box<dyn EventData>, serde_json::Error> + Send + Sync;

/// Registry errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A decoder is already registered for this tag
    #[error("event type already registered: {0}")]
    AlreadyRegistered(EventType),

    /// Empty type tags cannot be registered
    #[error("event type must not be empty")]
    EmptyEventType,
}

/// Thread-safe registry of payload decoders keyed by event type
///
/// # Example
///
/// ```
/// use eventkeel_core::{EventRegistry, EventType, Value};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Opened {
///     owner: String,
/// }
///
/// let registry = EventRegistry::new();
/// registry.register::<Opened>("Opened")?;
///
/// let raw = Value::object([("owner", Value::from("ada"))]);
/// let decoded = registry.decode(&EventType::from("Opened"), raw).unwrap()?;
/// assert_eq!(decoded.as_any().downcast_ref::<Opened>().unwrap().owner, "ada");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Default)]
pub struct EventRegistry {
    decoders: RwLock<FxHashMap<EventType, Arc<DecodeFn>>>,
}

impl EventRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` as the payload type for `event_type`
    pub fn register<T>(&self, event_type: impl Into<EventType>) -> Result<(), RegistryError>
    where
        T: EventData + DeserializeOwned,
    {
        let event_type = event_type.into();
        if event_type.is_empty() {
            return Err(RegistryError::EmptyEventType);
        }

        let mut decoders = self.decoders.write();
        if decoders.contains_key(&event_type) {
            return Err(RegistryError::AlreadyRegistered(event_type));
        }

        let decode: Arc<DecodeFn> = Arc::new(|raw: Value| {
            value::from_value::<T>(raw).map(|data| Box::new(data) as Box<dyn EventData>)
        });
        decoders.insert(event_type, decode);
        Ok(())
    }

    /// Remove the decoder for `event_type`, returning whether one existed
    pub fn unregister(&self, event_type: &EventType) -> bool {
        self.decoders.write().remove(event_type).is_some()
    }

    /// Check if a decoder exists for `event_type`
    pub fn is_registered(&self, event_type: &EventType) -> bool {
        self.decoders.read().contains_key(event_type)
    }

    /// All registered tags, sorted
    pub fn registered_types(&self) -> Vec<EventType> {
        let mut types: Vec<_> = self.decoders.read().keys().cloned().collect();
        types.sort();
        types
    }

    /// Decode a stored payload
    ///
    /// Returns `None` when no decoder is registered for `event_type`.
    pub fn decode(
        &self,
        event_type: &EventType,
        raw: Value,
    ) -> Option<Result<Box<dyn EventData>, serde_json::Error>> {
        // Clone the decoder out so user code never runs under the lock
        let decode = self.decoders.read().get(event_type).cloned()?;
        Some(decode(raw))
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry")
            .field("registered_types", &self.registered_types())
            .finish()
    }
}
