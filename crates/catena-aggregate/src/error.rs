//! Error types for aggregation and reduction.

use std::fmt;

use alloy_primitives::Address;
use catena_core::ContentAddress;
use serde::Serialize;
use thiserror::Error;

/// Errors that abort a whole aggregation run.
///
/// Per-avatar and per-link failures never surface here; they are collected
/// as [`ScanError`]s in the output.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// The request itself is malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A namespace operation failed outside of any single avatar.
    #[error("log error: {0}")]
    Log(#[from] catena_log::LogError),

    /// The run was cancelled.
    #[error("aggregation cancelled")]
    Cancelled,
}

/// Result type for aggregation operations.
pub type Result<T> = std::result::Result<T, AggregateError>;

/// Where in the pipeline a per-item failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStage {
    /// Registry pointer, profile or index lookup.
    Resolve,
    /// Blob retrieval or chain walk.
    Fetch,
    /// Decoding a chunk or a malformed link.
    Parse,
    /// Signature check could not complete.
    Verify,
    /// Signer not authorized by the avatar's profile.
    Authorize,
    /// Catalog payload fetch or classification.
    Payload,
}

impl fmt::Display for ScanStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Resolve => "resolve",
            Self::Fetch => "fetch",
            Self::Parse => "parse",
            Self::Verify => "verify",
            Self::Authorize => "authorize",
            Self::Payload => "payload",
        };
        f.write_str(s)
    }
}

/// A recoverable failure for one avatar, chunk or link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanError {
    /// The avatar being scanned.
    pub scope: Address,
    pub stage: ScanStage,
    pub content_address: Option<ContentAddress>,
    pub message: String,
}

impl ScanError {
    pub fn new(scope: Address, stage: ScanStage, message: impl Into<String>) -> Self {
        Self {
            scope,
            stage,
            content_address: None,
            message: message.into(),
        }
    }

    pub fn at(mut self, content_address: ContentAddress) -> Self {
        self.content_address = Some(content_address);
        self
    }
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.scope, self.message)?;
        if let Some(address) = &self.content_address {
            write!(f, " ({address})")?;
        }
        Ok(())
    }
}
