//! # Catena Core
//!
//! Pure primitives for Catena: canonical encoding, links, signers and the
//! documents that make up a namespace log.
//!
//! This crate contains no I/O, no storage, no networking. It is pure computation
//! over signed, content-addressed data structures.
//!
//! ## Key Types
//!
//! - [`Link`] - One signed, named pointer to content
//! - [`ContentAddress`] - Blake3 address of stored bytes
//! - [`Chunk`], [`Index`], [`Profile`] - Persisted namespace documents
//! - [`LinkSigner`] - Plain-key or contract-wallet signer
//! - [`OrderKey`] - The canonical total order over links
//!
//! ## Canonicalization
//!
//! Links are signed over canonical JSON with signature fields removed. See
//! the [`canonical`] module.

pub mod cancel;
pub mod canonical;
pub mod chunk;
pub mod crypto;
pub mod error;
pub mod link;
pub mod ordering;
pub mod signer;
pub mod types;
pub mod validation;

pub use alloy_primitives::{Address, Bytes, B256};

pub use cancel::CancellationToken;
pub use canonical::{signing_bytes, storage_bytes, Mode};
pub use chunk::{Chunk, Index, Profile, SigningKeyWindow, Upsert, DEFAULT_CHUNK_CAPACITY};
pub use crypto::{hash, Keypair, RecoverableSignature};
pub use error::{CoreError, ValidationError};
pub use link::{generate_nonce, Link, LinkBuilder};
pub use ordering::OrderKey;
pub use signer::{wallet_message_hash, ContractWalletSigner, LinkSigner, PlainKeySigner};
pub use types::ContentAddress;
pub use validation::{parse_address, parse_content_address, validate_link};
