//! Conditional-write table storage for eventkeel
//!
//! This crate defines the store contract the event engine is written against
//! and ships an in-process implementation:
//! - [`TableStore`]: point reads, partition queries, scans, conditional writes
//! - [`TableAdmin`]: table create/delete/describe
//! - [`Condition`] / [`UpdateExpression`]: write guards and attribute updates
//! - [`MemoryStore`]: DashMap-backed store with per-key atomic conditions

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod condition;
pub mod error;
pub mod item;
pub mod memory;
pub mod traits;

pub use condition::{Condition, UpdateExpression};
pub use error::{StorageError, StorageResult};
pub use item::{Item, Key, KeySchema};
pub use memory::{MemoryStore, Partition};
pub use traits::{ReadConsistency, TableAdmin, TableDescription, TableStore};
