//! Error types for the facade.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that can occur during Catena operations.
#[derive(Debug, Error)]
pub enum CatenaError {
    /// Missing or malformed configuration. Not recoverable.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation error.
    #[error("validation error: {0}")]
    Validation(#[from] catena_core::ValidationError),

    /// Encoding or key error.
    #[error("core error: {0}")]
    Core(#[from] catena_core::CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] catena_store::StoreError),

    /// Verification error.
    #[error("verification error: {0}")]
    Verify(#[from] catena_verify::VerifyError),

    /// Namespace error.
    #[error("log error: {0}")]
    Log(#[from] catena_log::LogError),

    /// Aggregation error.
    #[error("aggregation error: {0}")]
    Aggregate(#[from] catena_aggregate::AggregateError),
}

/// Result type for Catena operations.
pub type Result<T> = std::result::Result<T, CatenaError>;
