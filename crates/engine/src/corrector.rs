//! Historical corrections
//!
//! Operator tools that rewrite history in place. Neither changes an event's
//! identity or version, so stream ordering is preserved.

use crate::codec::{self, EventRecord, AGGREGATE_ID, EVENT_TYPE, VERSION};
use crate::error::{EventStoreError, Operation, Result};
use crate::store::EventStore;
use eventkeel_core::{Context, Event, EventType, Value};
use eventkeel_storage::{Condition, ReadConsistency, TableStore, UpdateExpression};
use tracing::{debug, info, warn};

impl<S: TableStore> EventStore<S> {
    /// Overwrite one stored event
    ///
    /// The event at `(event.aggregate_id, event.version)` is replaced by
    /// `event`: payload, type, timestamp, aggregate type, and metadata.
    ///
    /// # Errors
    ///
    /// - `AggregateNotFound`: the aggregate has no events
    /// - `MissingEvent`: the aggregate exists but has no event at that
    ///   version
    pub fn replace(&self, ctx: &Context, event: &Event) -> Result<()> {
        let op = Operation::Replace;
        let ctx = self.op_context(ctx);
        let aggregate_id = event.aggregate_id;

        let count = self
            .store
            .count(
                &ctx,
                self.table_name(),
                &aggregate_id.to_string(),
                ReadConsistency::Strong,
            )
            .map_err(|e| EventStoreError::storage_for(op, aggregate_id, None, e))?;
        if count == 0 {
            return Err(EventStoreError::AggregateNotFound { op, aggregate_id });
        }

        let item = codec::encode(event)
            .and_then(EventRecord::into_item)
            .map_err(|e| e.into_store_error(op))?;
        let present =
            Condition::attribute_exists(AGGREGATE_ID).and(Condition::attribute_exists(VERSION));

        match self
            .store
            .put_item(&ctx, self.table_name(), item, Some(&present))
        {
            Ok(()) => {
                debug!(%aggregate_id, version = event.version, "replaced event");
                Ok(())
            }
            Err(e) if e.is_condition_failed() => Err(EventStoreError::MissingEvent {
                op,
                aggregate_id,
                version: event.version,
            }),
            Err(e) => Err(EventStoreError::storage_for(op, aggregate_id, None, e)),
        }
    }

    /// Rename an event type across all history
    ///
    /// Every record tagged `from` is retagged `to`; nothing else changes.
    /// Returns the number of records renamed.
    ///
    /// Records are updated one at a time and the first failure aborts the
    /// rename. Records renamed before the failure stay renamed; running the
    /// rename again finishes the job.
    pub fn rename_event_type(&self, ctx: &Context, from: &EventType, to: &EventType) -> Result<usize> {
        let op = Operation::Rename;
        let ctx = self.op_context(ctx);

        let tagged = Condition::equals(EVENT_TYPE, from.as_str());
        let items = self
            .store
            .scan(&ctx, self.table_name(), Some(&tagged), ReadConsistency::Strong)
            .map_err(|e| EventStoreError::storage(op, e))?;

        let retag = UpdateExpression::new().set(EVENT_TYPE, Value::from(to.as_str()));
        let mut renamed = 0;

        for item in items {
            let record = EventRecord::from_item(item).map_err(|e| e.into_store_error(op))?;

            ctx.check().map_err(|e| {
                EventStoreError::storage_for(op, record.aggregate_id, None, e.into())
            })?;

            if let Err(e) = self.store.update_item(
                &ctx,
                self.table_name(),
                &record.key(),
                &retag,
                Some(&tagged),
            ) {
                warn!(
                    aggregate_id = %record.aggregate_id,
                    version = record.version,
                    renamed,
                    "rename aborted"
                );
                return Err(EventStoreError::storage_for(op, record.aggregate_id, None, e));
            }
            renamed += 1;
        }

        info!(%from, %to, renamed, "renamed event type");
        Ok(renamed)
    }
}
