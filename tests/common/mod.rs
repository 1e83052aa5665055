//! Shared test utilities for the eventkeel integration suites.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use eventkeel::{
    codec, AggregateId, Condition, Context, Event, EventRegistry, EventStore, EventStoreBuilder, Item,
    Key, KeySchema, MemoryStore, ReadConsistency, StorageError, StorageResult, TableAdmin,
    TableDescription, TableStore, UpdateExpression,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// =============================================================================
// Tracing
// =============================================================================

/// Install a fmt subscriber writing through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountOpened {
    pub owner: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposited {
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawn {
    pub amount: i64,
}

pub const AGGREGATE_TYPE: &str = "Account";

/// Registry with every test payload registered.
pub fn registry() -> Arc<EventRegistry> {
    let registry = EventRegistry::new();
    registry.register::<AccountOpened>("AccountOpened").unwrap();
    registry.register::<Deposited>("Deposited").unwrap();
    registry.register::<Withdrawn>("Withdrawn").unwrap();
    Arc::new(registry)
}

pub fn ctx() -> Context {
    Context::background()
}

/// Event store over a fresh memory store, table created.
pub fn event_store() -> EventStore<MemoryStore> {
    init_tracing();
    EventStoreBuilder::new()
        .registry(registry())
        .ephemeral()
        .expect("open ephemeral event store")
}

/// Event store over `store`, table created.
pub fn event_store_over<S: TableStore + TableAdmin>(store: Arc<S>) -> EventStore<S> {
    init_tracing();
    EventStoreBuilder::new()
        .registry(registry())
        .create_table_if_missing(true)
        .open(&ctx(), store)
        .expect("open event store")
}

pub fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000 + secs, 0).expect("valid timestamp")
}

pub fn deposit(id: AggregateId, version: u64, amount: i64) -> Event {
    Event::new(
        "Deposited",
        Deposited { amount },
        ts(version as i64),
        AGGREGATE_TYPE,
        id,
        version,
    )
}

/// Deposits for versions `from..from + count`, amount `version * 10`.
pub fn deposits(id: AggregateId, from: u64, count: u64) -> Vec<Event> {
    (from..from + count)
        .map(|v| deposit(id, v, v as i64 * 10))
        .collect()
}

pub fn versions(events: &[Event]) -> Vec<u64> {
    events.iter().map(|e| e.version).collect()
}

pub fn amounts(events: &[Event]) -> Vec<i64> {
    events
        .iter()
        .map(|e| e.data_as::<Deposited>().expect("deposit payload").amount)
        .collect()
}

// =============================================================================
// Fault injection
// =============================================================================

/// Memory store that fails `put_item` once a write budget is used up.
#[derive(Debug)]
pub struct FaultyStore {
    inner: MemoryStore,
    puts_left: AtomicUsize,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            puts_left: AtomicUsize::new(usize::MAX),
        }
    }

    /// Allow `n` more puts, then fail every put with `Unavailable`.
    pub fn fail_after(&self, n: usize) {
        self.puts_left.store(n, Ordering::SeqCst);
    }

    /// Stop failing.
    pub fn heal(&self) {
        self.puts_left.store(usize::MAX, Ordering::SeqCst);
    }
}

impl TableStore for FaultyStore {
    fn get_item(
        &self,
        ctx: &Context,
        table: &str,
        key: &Key,
        consistency: ReadConsistency,
    ) -> StorageResult<Option<Item>> {
        self.inner.get_item(ctx, table, key, consistency)
    }

    fn query(
        &self,
        ctx: &Context,
        table: &str,
        partition: &str,
        consistency: ReadConsistency,
    ) -> StorageResult<Vec<Item>> {
        self.inner.query(ctx, table, partition, consistency)
    }

    fn count(
        &self,
        ctx: &Context,
        table: &str,
        partition: &str,
        consistency: ReadConsistency,
    ) -> StorageResult<usize> {
        self.inner.count(ctx, table, partition, consistency)
    }

    fn scan(
        &self,
        ctx: &Context,
        table: &str,
        filter: Option<&Condition>,
        consistency: ReadConsistency,
    ) -> StorageResult<Vec<Item>> {
        self.inner.scan(ctx, table, filter, consistency)
    }

    fn put_item(
        &self,
        ctx: &Context,
        table: &str,
        item: Item,
        condition: Option<&Condition>,
    ) -> StorageResult<()> {
        let left = self.puts_left.load(Ordering::SeqCst);
        if left == 0 {
            return Err(StorageError::Unavailable("injected put failure".into()));
        }
        if left != usize::MAX {
            self.puts_left.store(left - 1, Ordering::SeqCst);
        }
        self.inner.put_item(ctx, table, item, condition)
    }

    fn update_item(
        &self,
        ctx: &Context,
        table: &str,
        key: &Key,
        update: &UpdateExpression,
        condition: Option<&Condition>,
    ) -> StorageResult<Item> {
        self.inner.update_item(ctx, table, key, update, condition)
    }
}

impl TableAdmin for FaultyStore {
    fn create_table(&self, ctx: &Context, name: &str, key_schema: KeySchema) -> StorageResult<()> {
        self.inner.create_table(ctx, name, key_schema)
    }

    fn delete_table(&self, ctx: &Context, name: &str) -> StorageResult<()> {
        self.inner.delete_table(ctx, name)
    }

    fn describe_table(&self, ctx: &Context, name: &str) -> StorageResult<Option<TableDescription>> {
        self.inner.describe_table(ctx, name)
    }
}

// =============================================================================
// Concurrent rewrites
// =============================================================================

/// Memory store that retypes the last record of the next scan after the scan
/// has read it, as a correction running on another node would.
#[derive(Debug, Default)]
pub struct RetypingStore {
    inner: MemoryStore,
    retype_to: Mutex<Option<String>>,
    retyped: Mutex<Option<Key>>,
}

impl RetypingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retag the last record returned by the next scan as `event_type`.
    pub fn retype_next_scan(&self, event_type: &str) {
        *self.retype_to.lock().unwrap() = Some(event_type.to_string());
    }

    /// Key of the record retyped, once it happened.
    pub fn retyped(&self) -> Option<Key> {
        self.retyped.lock().unwrap().clone()
    }
}

impl TableStore for RetypingStore {
    fn get_item(
        &self,
        ctx: &Context,
        table: &str,
        key: &Key,
        consistency: ReadConsistency,
    ) -> StorageResult<Option<Item>> {
        self.inner.get_item(ctx, table, key, consistency)
    }

    fn query(
        &self,
        ctx: &Context,
        table: &str,
        partition: &str,
        consistency: ReadConsistency,
    ) -> StorageResult<Vec<Item>> {
        self.inner.query(ctx, table, partition, consistency)
    }

    fn count(
        &self,
        ctx: &Context,
        table: &str,
        partition: &str,
        consistency: ReadConsistency,
    ) -> StorageResult<usize> {
        self.inner.count(ctx, table, partition, consistency)
    }

    fn scan(
        &self,
        ctx: &Context,
        table: &str,
        filter: Option<&Condition>,
        consistency: ReadConsistency,
    ) -> StorageResult<Vec<Item>> {
        let items = self.inner.scan(ctx, table, filter, consistency)?;
        let retype_to = self.retype_to.lock().unwrap().take();
        if let (Some(event_type), Some(last)) = (retype_to, items.last()) {
            let key = codec::key_schema().key_of(last)?;
            let retag = UpdateExpression::new().set(codec::EVENT_TYPE, event_type);
            self.inner.update_item(ctx, table, &key, &retag, None)?;
            *self.retyped.lock().unwrap() = Some(key);
        }
        Ok(items)
    }

    fn put_item(
        &self,
        ctx: &Context,
        table: &str,
        item: Item,
        condition: Option<&Condition>,
    ) -> StorageResult<()> {
        self.inner.put_item(ctx, table, item, condition)
    }

    fn update_item(
        &self,
        ctx: &Context,
        table: &str,
        key: &Key,
        update: &UpdateExpression,
        condition: Option<&Condition>,
    ) -> StorageResult<Item> {
        self.inner.update_item(ctx, table, key, update, condition)
    }
}

impl TableAdmin for RetypingStore {
    fn create_table(&self, ctx: &Context, name: &str, key_schema: KeySchema) -> StorageResult<()> {
        self.inner.create_table(ctx, name, key_schema)
    }

    fn delete_table(&self, ctx: &Context, name: &str) -> StorageResult<()> {
        self.inner.delete_table(ctx, name)
    }

    fn describe_table(&self, ctx: &Context, name: &str) -> StorageResult<Option<TableDescription>> {
        self.inner.describe_table(ctx, name)
    }
}
