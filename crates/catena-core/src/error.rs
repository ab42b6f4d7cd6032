//! Error types for Catena Core.

use thiserror::Error;

/// Core errors that can occur while encoding, hashing or signing.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("malformed signature: expected 65 bytes, got {0}")]
    MalformedSignature(usize),

    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    #[error("duplicate key after normalization: {0}")]
    DuplicateKey(String),

    #[error("number cannot be represented canonically: {0}")]
    NonCanonicalNumber(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("malformed document: {0}")]
    MalformedDocument(String),
}

/// Structural validation errors. Raised before any I/O is attempted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("link name must not be empty")]
    EmptyName,

    #[error("link name exceeds {max} bytes")]
    NameTooLong { max: usize },

    #[error("link name contains control characters")]
    NameControlChar,

    #[error("nonce must not be empty")]
    EmptyNonce,

    #[error("nonce exceeds {max} characters")]
    NonceTooLong { max: usize },

    #[error("signed_at must not be negative: {0}")]
    NegativeTimestamp(i64),

    #[error("address must not be the zero address")]
    ZeroAddress,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid content address: {0}")]
    InvalidContentAddress(String),

    #[error("link is not signed")]
    MissingSignature,

    #[error("namespace key must not be empty")]
    EmptyNamespaceKey,
}
