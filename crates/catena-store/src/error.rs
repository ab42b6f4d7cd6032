//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during blob, chain or registry operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No blob stored at the address.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// Blob larger than the store accepts.
    #[error("blob of {size} bytes exceeds capacity of {max} bytes")]
    CapacityExceeded { size: usize, max: usize },

    /// The backing service could not be reached or failed mid-request.
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock was poisoned or a blocking task failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Whether the error is a per-item condition a scan may skip past.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, StoreError::Migration(_) | StoreError::Internal(_))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
