//! Storage error types

use eventkeel_core::ContextError;
use thiserror::Error;

/// Errors reported by a [`TableStore`](crate::TableStore) or
/// [`TableAdmin`](crate::TableAdmin)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The write's condition did not hold at write time
    #[error("conditional check failed on table {table}")]
    ConditionalCheckFailed {
        /// Table the write targeted
        table: String,
    },

    /// The table does not exist
    #[error("table not found: {table}")]
    ResourceNotFound {
        /// Missing table
        table: String,
    },

    /// The table already exists
    #[error("table already exists: {table}")]
    ResourceInUse {
        /// Existing table
        table: String,
    },

    /// The request itself is malformed (missing key attribute, bad type)
    #[error("validation error: {0}")]
    Validation(String),

    /// The caller cancelled the request
    #[error("request cancelled")]
    Cancelled,

    /// The caller's deadline passed before the request completed
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// The service could not serve the request
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Check if this is a failed write condition
    pub fn is_condition_failed(&self) -> bool {
        matches!(self, StorageError::ConditionalCheckFailed { .. })
    }

    /// Check if this is a missing table
    pub fn is_resource_not_found(&self) -> bool {
        matches!(self, StorageError::ResourceNotFound { .. })
    }

    /// Check if the request was stopped by its context
    pub fn is_context_error(&self) -> bool {
        matches!(self, StorageError::Cancelled | StorageError::DeadlineExceeded)
    }
}

impl From<ContextError> for StorageError {
    fn from(e: ContextError) -> Self {
        match e {
            ContextError::Cancelled => StorageError::Cancelled,
            ContextError::DeadlineExceeded => StorageError::DeadlineExceeded,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;
