//! Events table lifecycle

use crate::codec;
use crate::error::{EventStoreError, Operation, Result};
use crate::store::EventStore;
use eventkeel_core::Context;
use eventkeel_storage::{StorageError, TableAdmin};
use tracing::info;

impl<S: TableAdmin> EventStore<S> {
    /// Create the events table
    ///
    /// Fails with a `Storage` error wrapping `ResourceInUse` if the table
    /// already exists.
    pub fn create_table(&self, ctx: &Context) -> Result<()> {
        let ctx = self.op_context(ctx);
        self.store
            .create_table(&ctx, self.table_name(), codec::key_schema())
            .map_err(|e| EventStoreError::storage(Operation::CreateTable, e))?;
        info!(table = self.table_name(), "created events table");
        Ok(())
    }

    /// Delete the events table and every event in it
    ///
    /// Deleting a table that does not exist succeeds.
    pub fn delete_table(&self, ctx: &Context) -> Result<()> {
        let ctx = self.op_context(ctx);
        match self.store.delete_table(&ctx, self.table_name()) {
            Ok(()) => {
                info!(table = self.table_name(), "deleted events table");
                Ok(())
            }
            Err(e) if e.is_resource_not_found() => Ok(()),
            Err(e) => Err(EventStoreError::storage(Operation::DeleteTable, e)),
        }
    }

    /// Check whether the events table exists
    pub fn table_exists(&self, ctx: &Context) -> Result<bool> {
        let ctx = self.op_context(ctx);
        self.store
            .describe_table(&ctx, self.table_name())
            .map(|d| d.is_some())
            .map_err(|e| EventStoreError::storage(Operation::DescribeTable, e))
    }

    /// Create the events table unless it already exists
    pub fn ensure_table(&self, ctx: &Context) -> Result<()> {
        if self.table_exists(ctx)? {
            return Ok(());
        }
        match self.create_table(ctx) {
            // Lost a race with another creator
            Err(EventStoreError::Storage {
                source: StorageError::ResourceInUse { .. },
                ..
            }) => Ok(()),
            other => other,
        }
    }
}
