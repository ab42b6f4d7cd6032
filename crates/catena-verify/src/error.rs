//! Error types for the verify module.

use alloy_primitives::Address;
use thiserror::Error;

/// Errors that can occur during verification.
///
/// An invalid signature is not an error; verification returns `Ok(false)`.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Signature bytes have the wrong length or shape. A caller bug.
    #[error("malformed signature: {0} bytes")]
    MalformedSignature(usize),

    /// The claimed identity is the zero address.
    #[error("claimed address must not be the zero address")]
    ZeroAddress,

    /// No verification convention produced a definite answer.
    #[error("verification inconclusive for {0}")]
    Inconclusive(Address),

    /// Chain lookup failed.
    #[error("chain error: {0}")]
    Chain(#[from] catena_store::StoreError),

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] catena_core::CoreError),
}

/// Result type for verify operations.
pub type Result<T> = std::result::Result<T, VerifyError>;
