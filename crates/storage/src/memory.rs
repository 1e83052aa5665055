//! In-process table store
//!
//! # Design
//!
//! - DashMap of tables, each table a DashMap of partitions
//! - Partition: BTreeMap keyed by sort key, so queries come back ordered
//! - Conditional writes evaluate and apply while holding the partition's
//!   shard lock, which makes each write atomic per key
//! - Different partitions only contend when they hash to the same shard
//!
//! Every read is strongly consistent; the requested [`ReadConsistency`] is
//! accepted and ignored.
//!
//! # Simulated round trips
//!
//! [`MemoryStore::with_latency`] makes every call wait before touching any
//! data, checking the caller's [`Context`] while it waits. A call whose
//! deadline passes or whose context is cancelled during that wait fails
//! without side effects, the way an aborted network request would.

use crate::condition::{Condition, UpdateExpression};
use crate::error::{StorageError, StorageResult};
use crate::item::{Item, Key, KeySchema};
use crate::traits::{ReadConsistency, TableAdmin, TableDescription, TableStore};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use eventkeel_core::{Context, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Items of one partition, ordered by sort key
#[derive(Debug, Default)]
pub struct Partition {
    pub(crate) items: BTreeMap<u64, Item>,
}

impl Partition {
    /// Create a new empty partition
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items in this partition
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if partition is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug)]
struct Table {
    schema: KeySchema,
    partitions: DashMap<String, Partition>,
    created_at: DateTime<Utc>,
}

impl Table {
    fn new(schema: KeySchema) -> Self {
        Self {
            schema,
            partitions: DashMap::new(),
            created_at: Utc::now(),
        }
    }

    fn item_count(&self) -> usize {
        self.partitions.iter().map(|p| p.value().len()).sum()
    }

    /// Drop a partition left empty by a rejected write
    fn discard_if_empty(&self, partition: &str) {
        self.partitions.remove_if(partition, |_, p| p.is_empty());
    }
}

/// Table store kept in process memory
///
/// # Example
///
/// ```
/// use eventkeel_core::{Context, Value};
/// use eventkeel_storage::{Condition, Item, KeySchema, MemoryStore, TableAdmin, TableStore};
///
/// let ctx = Context::background();
/// let store = MemoryStore::new();
/// store.create_table(&ctx, "t", KeySchema::new("pk", "sk"))?;
///
/// let item = Item::from([
///     ("pk".to_string(), Value::from("a")),
///     ("sk".to_string(), Value::Int(1)),
/// ]);
/// let absent = Condition::attribute_not_exists("pk");
/// store.put_item(&ctx, "t", item.clone(), Some(&absent))?;
/// assert!(store.put_item(&ctx, "t", item, Some(&absent)).is_err());
/// # Ok::<(), eventkeel_storage::StorageError>(())
/// ```
pub struct MemoryStore {
    tables: DashMap<String, Arc<Table>>,
    latency: Option<Duration>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
            latency: None,
        }
    }

    /// Make every call wait `latency` before executing
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Number of tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    fn table(&self, name: &str) -> StorageResult<Arc<Table>> {
        self.tables
            .get(name)
            .map(|t| Arc::clone(t.value()))
            .ok_or_else(|| StorageError::ResourceNotFound {
                table: name.to_string(),
            })
    }

    fn round_trip(&self, ctx: &Context) -> StorageResult<()> {
        ctx.check()?;
        if let Some(latency) = self.latency {
            // Unrepresentable latency waits until the context gives up
            let done = Instant::now().checked_add(latency);
            loop {
                let now = Instant::now();
                let left = match done {
                    Some(done) if now >= done => break,
                    Some(done) => done - now,
                    None => POLL_INTERVAL,
                };
                ctx.check()?;
                std::thread::sleep(left.min(POLL_INTERVAL));
            }
            ctx.check()?;
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("table_count", &self.table_count())
            .field("latency", &self.latency)
            .finish()
    }
}

impl TableStore for MemoryStore {
    fn get_item(
        &self,
        ctx: &Context,
        table: &str,
        key: &Key,
        _consistency: ReadConsistency,
    ) -> StorageResult<Option<Item>> {
        self.round_trip(ctx)?;
        let t = self.table(table)?;
        let item = t
            .partitions
            .get(&key.partition)
            .and_then(|p| p.items.get(&key.sort).cloned());
        Ok(item)
    }

    fn query(
        &self,
        ctx: &Context,
        table: &str,
        partition: &str,
        _consistency: ReadConsistency,
    ) -> StorageResult<Vec<Item>> {
        self.round_trip(ctx)?;
        let t = self.table(table)?;
        let items = t
            .partitions
            .get(partition)
            .map(|p| p.items.values().cloned().collect())
            .unwrap_or_default();
        Ok(items)
    }

    fn count(
        &self,
        ctx: &Context,
        table: &str,
        partition: &str,
        _consistency: ReadConsistency,
    ) -> StorageResult<usize> {
        self.round_trip(ctx)?;
        let t = self.table(table)?;
        Ok(t.partitions.get(partition).map(|p| p.len()).unwrap_or(0))
    }

    fn scan(
        &self,
        ctx: &Context,
        table: &str,
        filter: Option<&Condition>,
        _consistency: ReadConsistency,
    ) -> StorageResult<Vec<Item>> {
        self.round_trip(ctx)?;
        let t = self.table(table)?;
        let mut items = Vec::new();
        for partition in t.partitions.iter() {
            items.extend(
                partition
                    .items
                    .values()
                    .filter(|item| filter.map_or(true, |f| f.evaluate(Some(item))))
                    .cloned(),
            );
        }
        trace!(table, matched = items.len(), "scan complete");
        Ok(items)
    }

    fn put_item(
        &self,
        ctx: &Context,
        table: &str,
        item: Item,
        condition: Option<&Condition>,
    ) -> StorageResult<()> {
        self.round_trip(ctx)?;
        let t = self.table(table)?;
        let key = t.schema.key_of(&item)?;

        {
            // Shard write lock held from evaluation through insert
            let mut partition = t.partitions.entry(key.partition.clone()).or_default();
            let holds = condition.map_or(true, |c| c.evaluate(partition.items.get(&key.sort)));
            if holds {
                partition.items.insert(key.sort, item);
                return Ok(());
            }
        }

        t.discard_if_empty(&key.partition);
        Err(StorageError::ConditionalCheckFailed {
            table: table.to_string(),
        })
    }

    fn update_item(
        &self,
        ctx: &Context,
        table: &str,
        key: &Key,
        update: &UpdateExpression,
        condition: Option<&Condition>,
    ) -> StorageResult<Item> {
        self.round_trip(ctx)?;
        let t = self.table(table)?;

        if let Some((name, _)) = update
            .assignments()
            .iter()
            .find(|(name, _)| t.schema.is_key_attribute(name))
        {
            return Err(StorageError::Validation(format!(
                "cannot update key attribute {}",
                name
            )));
        }
        let sort = i64::try_from(key.sort).map_err(|_| {
            StorageError::Validation(format!("sort key {} out of range", key.sort))
        })?;

        {
            let mut partition = t.partitions.entry(key.partition.clone()).or_default();
            let holds = condition.map_or(true, |c| c.evaluate(partition.items.get(&key.sort)));
            if holds {
                let item = partition.items.entry(key.sort).or_insert_with(|| {
                    Item::from([
                        (t.schema.partition_key.clone(), Value::from(key.partition.as_str())),
                        (t.schema.sort_key.clone(), Value::Int(sort)),
                    ])
                });
                update.apply(item);
                return Ok(item.clone());
            }
        }

        t.discard_if_empty(&key.partition);
        Err(StorageError::ConditionalCheckFailed {
            table: table.to_string(),
        })
    }
}

impl TableAdmin for MemoryStore {
    fn create_table(&self, ctx: &Context, name: &str, key_schema: KeySchema) -> StorageResult<()> {
        self.round_trip(ctx)?;
        if name.is_empty() {
            return Err(StorageError::Validation("table name must not be empty".into()));
        }
        if key_schema.partition_key == key_schema.sort_key {
            return Err(StorageError::Validation(
                "partition and sort key must be different attributes".into(),
            ));
        }

        match self.tables.entry(name.to_string()) {
            Entry::Occupied(_) => Err(StorageError::ResourceInUse {
                table: name.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Table::new(key_schema)));
                debug!(table = name, "created table");
                Ok(())
            }
        }
    }

    fn delete_table(&self, ctx: &Context, name: &str) -> StorageResult<()> {
        self.round_trip(ctx)?;
        match self.tables.remove(name) {
            Some(_) => {
                debug!(table = name, "deleted table");
                Ok(())
            }
            None => Err(StorageError::ResourceNotFound {
                table: name.to_string(),
            }),
        }
    }

    fn describe_table(&self, ctx: &Context, name: &str) -> StorageResult<Option<TableDescription>> {
        self.round_trip(ctx)?;
        Ok(self.tables.get(name).map(|t| TableDescription {
            name: name.to_string(),
            key_schema: t.schema.clone(),
            item_count: t.item_count(),
            created_at: t.created_at,
        }))
    }
}
