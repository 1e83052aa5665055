//! Items, primary keys, and key schemas
//!
//! An [`Item`] is a map of attribute names to [`Value`]s. Every table has a
//! [`KeySchema`] naming two of those attributes: a string partition key and
//! a non-negative integer sort key. Items are ordered by sort key within a
//! partition.

use crate::error::{StorageError, StorageResult};
use eventkeel_core::Value;
use std::collections::HashMap;
use std::fmt;

/// A stored record
pub type Item = HashMap<String, Value>;

/// Primary key of an item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    /// Partition key value
    pub partition: String,
    /// Sort key value
    pub sort: u64,
}

impl Key {
    /// Create a new key
    pub fn new(partition: impl Into<String>, sort: u64) -> Self {
        Self {
            partition: partition.into(),
            sort,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.partition, self.sort)
    }
}

/// Names of a table's key attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    /// Partition (hash) key attribute, holds a `Value::String`
    pub partition_key: String,
    /// Sort (range) key attribute, holds a non-negative `Value::Int`
    pub sort_key: String,
}

impl KeySchema {
    /// Create a new key schema
    pub fn new(partition_key: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: sort_key.into(),
        }
    }

    /// Extract and validate the primary key of an item
    pub fn key_of(&self, item: &Item) -> StorageResult<Key> {
        let partition = match item.get(&self.partition_key) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(other) => {
                return Err(StorageError::Validation(format!(
                    "partition key {} must be a non-empty String, got {}",
                    self.partition_key,
                    other.type_name()
                )))
            }
            None => {
                return Err(StorageError::Validation(format!(
                    "missing partition key {}",
                    self.partition_key
                )))
            }
        };

        let sort = match item.get(&self.sort_key) {
            Some(Value::Int(i)) if *i >= 0 => *i as u64,
            Some(other) => {
                return Err(StorageError::Validation(format!(
                    "sort key {} must be a non-negative Int, got {:?}",
                    self.sort_key, other
                )))
            }
            None => {
                return Err(StorageError::Validation(format!(
                    "missing sort key {}",
                    self.sort_key
                )))
            }
        };

        Ok(Key { partition, sort })
    }

    /// Check if an attribute is part of the primary key
    pub fn is_key_attribute(&self, name: &str) -> bool {
        name == self.partition_key || name == self.sort_key
    }
}
