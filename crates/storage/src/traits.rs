//! Store capability traits
//!
//! [`TableStore`] is the contract the event engine relies on: point reads,
//! partition queries, filtered scans, and conditional writes that are atomic
//! per key. [`TableAdmin`] covers table provisioning.
//!
//! Implementations must make each conditional write linearizable per key:
//! the condition is evaluated against the latest committed item and the
//! write is applied only if it holds, with no interleaving write to the same
//! key in between. Nothing else is required; there are no multi-key
//! transactions.

use crate::condition::{Condition, UpdateExpression};
use crate::error::StorageResult;
use crate::item::{Item, Key, KeySchema};
use chrono::{DateTime, Utc};
use eventkeel_core::Context;

/// Read consistency requested by a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadConsistency {
    /// May miss recently completed writes
    #[default]
    Eventual,
    /// Observes every write that completed before the read began
    Strong,
}

/// Ordered key-value table operations
pub trait TableStore: Send + Sync {
    /// Read one item by primary key
    fn get_item(
        &self,
        ctx: &Context,
        table: &str,
        key: &Key,
        consistency: ReadConsistency,
    ) -> StorageResult<Option<Item>>;

    /// Read every item of a partition, ascending by sort key
    fn query(
        &self,
        ctx: &Context,
        table: &str,
        partition: &str,
        consistency: ReadConsistency,
    ) -> StorageResult<Vec<Item>>;

    /// Count the items of a partition
    fn count(
        &self,
        ctx: &Context,
        table: &str,
        partition: &str,
        consistency: ReadConsistency,
    ) -> StorageResult<usize>;

    /// Read every item in the table matching `filter`
    ///
    /// No order is guaranteed across partitions.
    fn scan(
        &self,
        ctx: &Context,
        table: &str,
        filter: Option<&Condition>,
        consistency: ReadConsistency,
    ) -> StorageResult<Vec<Item>>;

    /// Write a whole item, replacing any item under the same key
    ///
    /// When `condition` is given and does not hold for the current item,
    /// fails with `ConditionalCheckFailed` and writes nothing.
    fn put_item(
        &self,
        ctx: &Context,
        table: &str,
        item: Item,
        condition: Option<&Condition>,
    ) -> StorageResult<()>;

    /// Apply an attribute-level update to the item at `key`
    ///
    /// Returns the item as stored after the update. When `condition` is
    /// given and does not hold, fails with `ConditionalCheckFailed`.
    fn update_item(
        &self,
        ctx: &Context,
        table: &str,
        key: &Key,
        update: &UpdateExpression,
        condition: Option<&Condition>,
    ) -> StorageResult<Item>;
}

/// Summary of an existing table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescription {
    /// Table name
    pub name: String,
    /// Key attributes
    pub key_schema: KeySchema,
    /// Number of stored items
    pub item_count: usize,
    /// When the table was created
    pub created_at: DateTime<Utc>,
}

/// Table provisioning
pub trait TableAdmin: Send + Sync {
    /// Create a table; fails with `ResourceInUse` if it exists
    fn create_table(&self, ctx: &Context, name: &str, key_schema: KeySchema) -> StorageResult<()>;

    /// Delete a table; fails with `ResourceNotFound` if it does not exist
    fn delete_table(&self, ctx: &Context, name: &str) -> StorageResult<()>;

    /// Describe a table, or `None` if it does not exist
    fn describe_table(&self, ctx: &Context, name: &str) -> StorageResult<Option<TableDescription>>;
}
