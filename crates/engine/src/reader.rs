//! Strongly consistent loads

use crate::codec::{self, EventRecord, VERSION};
use crate::error::{EventStoreError, Operation, Result};
use crate::store::EventStore;
use eventkeel_core::{AggregateId, Context, Event, Value};
use eventkeel_storage::{ReadConsistency, TableStore};
use tracing::trace;

impl<S: TableStore> EventStore<S> {
    /// Load every event of an aggregate, ascending by version
    ///
    /// Returns an empty list when the aggregate has no events, and also when
    /// the events table does not exist.
    pub fn load_aggregate(&self, ctx: &Context, aggregate_id: AggregateId) -> Result<Vec<Event>> {
        let op = Operation::Load;
        let ctx = self.op_context(ctx);

        let items = match self.store.query(
            &ctx,
            self.table_name(),
            &aggregate_id.to_string(),
            ReadConsistency::Strong,
        ) {
            Ok(items) => items,
            Err(e) if e.is_resource_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(EventStoreError::storage_for(op, aggregate_id, None, e)),
        };

        trace!(%aggregate_id, count = items.len(), "loaded aggregate");
        items
            .into_iter()
            .map(|item| codec::decode_item(item, &self.registry).map_err(|e| e.into_store_error(op)))
            .collect()
    }

    /// Load every stored event
    ///
    /// Events of one aggregate come back in version order; no order holds
    /// across aggregates. A missing table is a `Storage` error.
    pub fn load_all(&self, ctx: &Context) -> Result<Vec<Event>> {
        let op = Operation::LoadAll;
        let ctx = self.op_context(ctx);

        let items = self
            .store
            .scan(&ctx, self.table_name(), None, ReadConsistency::Strong)
            .map_err(|e| EventStoreError::storage(op, e))?;

        let mut records = items
            .into_iter()
            .map(|item| EventRecord::from_item(item).map_err(|e| e.into_store_error(op)))
            .collect::<Result<Vec<_>>>()?;
        records.sort_by(|a, b| {
            a.aggregate_id
                .cmp(&b.aggregate_id)
                .then(a.version.cmp(&b.version))
        });

        trace!(count = records.len(), "loaded all events");
        records
            .into_iter()
            .map(|record| codec::decode(record, &self.registry).map_err(|e| e.into_store_error(op)))
            .collect()
    }

    /// Highest stored version of an aggregate, 0 when it has none
    ///
    /// Use it to find where to resume after a partially applied append.
    pub fn current_version(&self, ctx: &Context, aggregate_id: AggregateId) -> Result<u64> {
        let op = Operation::Load;
        let ctx = self.op_context(ctx);

        let items = match self.store.query(
            &ctx,
            self.table_name(),
            &aggregate_id.to_string(),
            ReadConsistency::Strong,
        ) {
            Ok(items) => items,
            Err(e) if e.is_resource_not_found() => return Ok(0),
            Err(e) => return Err(EventStoreError::storage_for(op, aggregate_id, None, e)),
        };

        let version = items
            .last()
            .and_then(|item| item.get(VERSION))
            .and_then(Value::as_int)
            .unwrap_or(0);
        Ok(version.max(0) as u64)
    }
}
