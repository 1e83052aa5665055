//! Event store configuration

use crate::error::{EventStoreError, Result};
use std::time::Duration;

/// Default events table name
pub const DEFAULT_TABLE_NAME: &str = "eventkeel_events";

/// Longest accepted table name
pub const MAX_TABLE_NAME_LEN: usize = 255;

/// Configuration for an [`EventStore`](crate::EventStore)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventStoreConfig {
    /// Table holding the event records
    pub table_name: String,
    /// Upper bound on each operation, on top of the caller's deadline
    pub operation_timeout: Option<Duration>,
}

impl Default for EventStoreConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            operation_timeout: None,
        }
    }
}

impl EventStoreConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the table name
    pub fn with_table_name(mut self, table_name: impl Into<String>) -> Self {
        self.table_name = table_name.into();
        self
    }

    /// Bound every operation by `timeout`
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = Some(timeout);
        self
    }

    /// Check the configuration is usable
    ///
    /// Table names must be 3 to 255 characters of `[A-Za-z0-9_.-]`.
    pub fn validate(&self) -> Result<()> {
        let name = &self.table_name;
        if name.len() < 3 || name.len() > MAX_TABLE_NAME_LEN {
            return Err(EventStoreError::InvalidConfig(format!(
                "table name must be 3 to {} characters, got {}",
                MAX_TABLE_NAME_LEN,
                name.len()
            )));
        }
        if let Some(c) = name
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(EventStoreError::InvalidConfig(format!(
                "table name {:?} contains invalid character {:?}",
                name, c
            )));
        }
        if self.operation_timeout == Some(Duration::ZERO) {
            return Err(EventStoreError::InvalidConfig(
                "operation timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
