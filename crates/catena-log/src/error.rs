//! Error types for the log module.

use catena_core::ContentAddress;
use thiserror::Error;

/// Errors that can occur while writing or reading a namespace.
#[derive(Debug, Error)]
pub enum LogError {
    /// A record or argument failed structural validation. Nothing was written.
    #[error("validation error: {0}")]
    Validation(#[from] catena_core::ValidationError),

    /// Encoding or decoding failed.
    #[error("core error: {0}")]
    Core(#[from] catena_core::CoreError),

    /// Blob or registry operation failed.
    #[error("store error: {0}")]
    Store(#[from] catena_store::StoreError),

    /// Signature verification could not complete.
    #[error("verify error: {0}")]
    Verify(#[from] catena_verify::VerifyError),

    /// The chunk chain loops back on itself.
    #[error("chunk cycle detected at {0}")]
    CycleDetected(ContentAddress),

    /// The walk visited more chunks than allowed.
    #[error("walk exceeded {0} chunks")]
    MaxDepth(usize),

    /// Chunk capacity must be at least one.
    #[error("invalid chunk capacity: {0}")]
    InvalidCapacity(usize),

    /// The walk was cancelled.
    #[error("cancelled")]
    Cancelled,
}

/// Result type for log operations.
pub type Result<T> = std::result::Result<T, LogError>;
