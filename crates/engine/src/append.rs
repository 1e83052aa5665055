//! Optimistic-concurrency append
//!
//! Each event is written with its own conditional put guarded by
//! `attribute_not_exists(aggregate_id) AND attribute_not_exists(version)`.
//! A slot can therefore be claimed by exactly one writer; every other writer
//! racing for the same version gets a `ConcurrencyConflict`.
//!
//! # Partial batches
//!
//! A batch is NOT atomic. The events are written one after another, and the
//! first failure stops the batch with the earlier events already committed.
//! After a failure at event `j` of a batch for versions `v+1..=v+k`, the
//! store holds versions `1..v+j-1` (counting `j` from 1). Nothing is rolled
//! back. A caller that needs the whole batch must reload
//! ([`EventStore::current_version`]) and append the missing suffix.

use crate::codec::{self, AGGREGATE_ID, MAX_VERSION, VERSION};
use crate::error::{EventStoreError, Operation, Result};
use crate::store::EventStore;
use eventkeel_core::{Context, Event};
use eventkeel_storage::{Condition, TableStore};
use tracing::{debug, warn};

impl<S: TableStore> EventStore<S> {
    /// Append a batch of events to one aggregate
    ///
    /// `expected_version` is the version the caller last observed (0 for a
    /// new aggregate); event `i` of the batch must carry
    /// `expected_version + 1 + i`.
    ///
    /// # Errors
    ///
    /// Checked before anything is written:
    /// - `NoEvents`: the batch is empty
    /// - `MismatchedAggregate`: events belong to different aggregates
    /// - `IncorrectVersion`: versions are not the next ones in sequence, or
    ///   would run past [`MAX_VERSION`](crate::codec::MAX_VERSION)
    /// - `PayloadEncoding`: a payload cannot be serialized
    ///
    /// Raised while writing, leaving earlier events of the batch committed:
    /// - `ConcurrencyConflict`: the version slot is already taken
    /// - `Storage`: the store failed, or the context expired or was cancelled
    pub fn append(&self, ctx: &Context, events: &[Event], expected_version: u64) -> Result<()> {
        let op = Operation::Save;
        let first = events.first().ok_or(EventStoreError::NoEvents { op })?;
        let aggregate_id = first.aggregate_id;

        for (index, event) in events.iter().enumerate() {
            if event.aggregate_id != aggregate_id {
                return Err(EventStoreError::MismatchedAggregate {
                    op,
                    expected: aggregate_id,
                    found: event.aggregate_id,
                    version: event.version,
                    expected_version: Some(expected_version),
                });
            }
            let wanted = expected_version
                .checked_add(1 + index as u64)
                .filter(|v| *v <= MAX_VERSION);
            if wanted != Some(event.version) {
                return Err(EventStoreError::IncorrectVersion {
                    op,
                    aggregate_id,
                    expected_version,
                    index,
                    wanted,
                    found: event.version,
                });
            }
        }

        let writes = events
            .iter()
            .map(|event| -> std::result::Result<_, codec::CodecError> {
                let record = codec::encode(event)?;
                let aggregate_type = record.aggregate_type.clone();
                Ok((event.version, aggregate_type, record.into_item()?))
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| e.into_store_error_at(op, Some(expected_version)))?;

        let ctx = self.op_context(ctx);
        let slot_free =
            Condition::attribute_not_exists(AGGREGATE_ID).and(Condition::attribute_not_exists(VERSION));

        for (version, aggregate_type, item) in writes {
            ctx.check().map_err(|e| {
                EventStoreError::storage_for(op, aggregate_id, Some(expected_version), e.into())
            })?;

            match self
                .store
                .put_item(&ctx, self.table_name(), item, Some(&slot_free))
            {
                Ok(()) => {
                    debug!(%aggregate_id, version, "appended event");
                }
                Err(e) if e.is_condition_failed() => {
                    warn!(
                        %aggregate_id,
                        version,
                        expected_version,
                        "version already taken"
                    );
                    return Err(EventStoreError::ConcurrencyConflict {
                        op,
                        aggregate_id,
                        aggregate_type,
                        expected_version,
                        version,
                    });
                }
                Err(e) => {
                    return Err(EventStoreError::storage_for(
                        op,
                        aggregate_id,
                        Some(expected_version),
                        e,
                    ))
                }
            }
        }

        Ok(())
    }
}
