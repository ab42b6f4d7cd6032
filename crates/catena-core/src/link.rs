//! Link: one signed, named pointer to content.
//!
//! A link is created once by a writer and never mutated afterward. Its
//! signature covers the canonical encoding of every other field, so changing
//! any field invalidates it.

use alloy_primitives::{Address, Bytes, B256};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::canonical::signing_bytes;
use crate::crypto::hash;
use crate::error::CoreError;
use crate::signer::LinkSigner;
use crate::types::ContentAddress;

/// Number of random bytes in a generated nonce.
pub const NONCE_BYTES: usize = 16;

/// A signed link record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    /// Logical name, e.g. `items/cup`.
    pub name: String,

    /// Blake3 address of the referenced content.
    pub content_address: ContentAddress,

    /// Chain the link was signed for.
    pub chain_id: u64,

    /// Author-claimed signing time (Unix milliseconds). Untrusted.
    pub signed_at: i64,

    /// Per-link unique value for replay detection.
    pub nonce: String,

    /// Whether the referenced content is ciphertext.
    #[serde(default)]
    pub encrypted: bool,

    pub signer_address: Address,

    /// 65-byte `r || s || v`, or wallet-specific bytes for contract signers.
    #[serde(default)]
    pub signature: Bytes,
}

impl Link {
    /// Canonical bytes covered by the signature.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, CoreError> {
        signing_bytes(self)
    }

    /// Keccak-256 of the signing bytes.
    pub fn signing_hash(&self) -> Result<B256, CoreError> {
        Ok(hash(&self.signing_bytes()?))
    }

    /// Identity used for global deduplication.
    ///
    /// Two links with the same fields (signature aside) are the same record.
    pub fn identity_hash(&self) -> Result<B256, CoreError> {
        self.signing_hash()
    }

    /// Whether the link carries a signature at all.
    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }

    /// Case-insensitive name match.
    pub fn name_matches(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Generate a fresh random nonce (16 bytes, lowercase hex).
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Builder for creating signed links.
pub struct LinkBuilder {
    name: String,
    content_address: ContentAddress,
    chain_id: u64,
    signed_at: i64,
    nonce: Option<String>,
    encrypted: bool,
}

impl LinkBuilder {
    /// Start building a link.
    pub fn new(name: impl Into<String>, content_address: ContentAddress, chain_id: u64) -> Self {
        Self {
            name: name.into(),
            content_address,
            chain_id,
            signed_at: 0,
            nonce: None,
            encrypted: false,
        }
    }

    /// Set the signing time.
    pub fn signed_at(mut self, ts: i64) -> Self {
        self.signed_at = ts;
        self
    }

    /// Use a fixed nonce instead of a random one.
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Mark the content as encrypted.
    pub fn encrypted(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    /// Stamp the signer address, then sign.
    pub fn sign(self, signer: &LinkSigner) -> Result<Link, CoreError> {
        let mut link = Link {
            name: self.name,
            content_address: self.content_address,
            chain_id: self.chain_id,
            signed_at: self.signed_at,
            nonce: self.nonce.unwrap_or_else(generate_nonce),
            encrypted: self.encrypted,
            signer_address: signer.address(),
            signature: Bytes::new(),
        };

        let payload_hash = link.signing_hash()?;
        link.signature = signer.sign_hash(&payload_hash)?;
        Ok(link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Keypair, RecoverableSignature};

    fn signer() -> LinkSigner {
        LinkSigner::plain(Keypair::from_seed(&[0x42; 32]).unwrap())
    }

    fn cup() -> Link {
        LinkBuilder::new("items/cup", ContentAddress::digest(b"cup"), 1)
            .signed_at(100)
            .nonce("00ff")
            .sign(&signer())
            .unwrap()
    }

    #[test]
    fn test_builder_stamps_signer_and_signs() {
        let link = cup();
        assert_eq!(link.signer_address, signer().address());
        assert!(link.is_signed());

        let sig = RecoverableSignature::from_slice(&link.signature).unwrap();
        let recovered = sig.recover_address(&link.signing_hash().unwrap()).unwrap();
        assert_eq!(recovered, link.signer_address);
    }

    #[test]
    fn test_signing_bytes_exclude_signature() {
        let link = cup();
        let text = String::from_utf8(link.signing_bytes().unwrap()).unwrap();
        assert!(!text.contains("signature\""));
        assert!(text.starts_with("{\"chainId\":1,\"contentAddress\":"));

        let mut unsigned = link.clone();
        unsigned.signature = Bytes::new();
        assert_eq!(unsigned.signing_hash().unwrap(), link.signing_hash().unwrap());
    }

    #[test]
    fn test_field_change_changes_hash() {
        let link = cup();
        let mut tampered = link.clone();
        tampered.signed_at += 1;
        assert_ne!(tampered.signing_hash().unwrap(), link.signing_hash().unwrap());
    }

    #[test]
    fn test_json_is_camel_case() {
        let value = serde_json::to_value(cup()).unwrap();
        assert!(value.get("contentAddress").is_some());
        assert!(value.get("signerAddress").is_some());
        assert!(value.get("signedAt").is_some());
        assert!(value["signature"].as_str().unwrap().starts_with("0x"));
    }

    #[test]
    fn test_generated_nonces_differ() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_eq!(a.len(), NONCE_BYTES * 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_name_matches_ignores_case() {
        assert!(cup().name_matches("ITEMS/Cup"));
        assert!(!cup().name_matches("items/bag"));
    }
}
