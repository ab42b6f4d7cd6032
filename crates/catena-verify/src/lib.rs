//! # Catena Verify
//!
//! Signature verification and replay tracking.
//!
//! ## Overview
//!
//! A link names its signer by address. That address is either a plain key
//! (no code on chain) or a contract wallet (has code). The verifier
//! classifies the address once, caches the answer, then:
//!
//! - **Plain key**: recovers the public key from the 65-byte signature and
//!   compares addresses. Upper-half `s` values are rejected.
//! - **Contract wallet**: calls `isValidSignature` under each supported
//!   [`Convention`], trying the one that last worked first. A revert means
//!   invalid; an empty or failed call is inconclusive and the next
//!   convention is tried.
//!
//! Replay tracking lives in [`NonceRegistry`], which the caller owns.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use catena_store::MemoryChain;
//! use catena_verify::SignatureVerifier;
//!
//! async fn example(link: catena_core::Link) {
//!     let verifier = SignatureVerifier::new(Arc::new(MemoryChain::new()));
//!     let valid = verifier.verify_link(&link).await.unwrap();
//!     println!("valid: {valid}");
//! }
//! ```

pub mod cache;
pub mod convention;
pub mod error;
pub mod nonce;
pub mod verifier;

pub use cache::{CacheStats, SoftCache, DEFAULT_CACHE_CAPACITY};
pub use convention::{AccountKind, Convention, Verdict};
pub use error::{Result, VerifyError};
pub use nonce::{NonceRegistry, ReplayScope};
pub use verifier::{SignatureVerifier, VerifierConfig};
