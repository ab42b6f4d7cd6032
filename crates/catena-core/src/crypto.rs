//! Cryptographic primitives for Catena.
//!
//! Wraps secp256k1 signing, public-key recovery and Keccak-256 hashing with
//! strong types. Signatures are the 65-byte `r || s || v` form used by EVM
//! tooling.

use alloy_primitives::{keccak256, Address, B256};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use std::fmt;

use crate::error::CoreError;

/// Length of a recoverable secp256k1 signature.
pub const SIGNATURE_LEN: usize = 65;

/// Half of the secp256k1 group order, big-endian.
///
/// Signatures with `s` above this value are malleable twins of a low-`s`
/// signature and are rejected (EIP-2).
pub const SECP256K1_HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// Compute the Keccak-256 hash of the given data.
pub fn hash(data: &[u8]) -> B256 {
    keccak256(data)
}

/// A parsed 65-byte recoverable signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    r: [u8; 32],
    s: [u8; 32],
    v: u8,
}

impl RecoverableSignature {
    /// Parse `r || s || v`. Any length other than 65 is a caller bug.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CoreError> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(CoreError::MalformedSignature(bytes.len()));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..64]);
        Ok(Self { r, s, v: bytes[64] })
    }

    /// Build from components.
    pub const fn from_parts(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Self { r, s, v }
    }

    /// Serialize to `r || s || v`.
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        let mut out = [0u8; SIGNATURE_LEN];
        out[..32].copy_from_slice(&self.r);
        out[32..64].copy_from_slice(&self.s);
        out[64] = self.v;
        out
    }

    pub fn r(&self) -> &[u8; 32] {
        &self.r
    }

    pub fn s(&self) -> &[u8; 32] {
        &self.s
    }

    pub fn v(&self) -> u8 {
        self.v
    }

    /// Whether `s` lies in the lower half of the curve order.
    pub fn is_low_s(&self) -> bool {
        // Big-endian byte order compares like the integers
        self.s <= SECP256K1_HALF_ORDER
    }

    /// The recovery id, accepting both `{0, 1}` and `{27, 28}` encodings.
    pub fn recovery_id(&self) -> Result<RecoveryId, CoreError> {
        let normalized = match self.v {
            0 | 1 => self.v,
            27 | 28 => self.v - 27,
            _ => return Err(CoreError::InvalidSignature),
        };
        RecoveryId::from_byte(normalized).ok_or(CoreError::InvalidSignature)
    }

    /// Recover the signer address from a 32-byte prehash.
    ///
    /// This performs no malleability check; callers that accept signatures
    /// from the outside must check [`is_low_s`](Self::is_low_s) first.
    pub fn recover_address(&self, prehash: &B256) -> Result<Address, CoreError> {
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);
        let signature = Signature::from_slice(&rs).map_err(|_| CoreError::InvalidSignature)?;
        let recid = self.recovery_id()?;
        let key = VerifyingKey::recover_from_prehash(prehash.as_slice(), &signature, recid)
            .map_err(|_| CoreError::InvalidSignature)?;
        Ok(Address::from_public_key(&key))
    }
}

impl fmt::Debug for RecoverableSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sig({}...)", &hex::encode(self.r)[..16])
    }
}

/// A secp256k1 keypair for signing links.
#[derive(Clone)]
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a new random keypair.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        Self {
            signing_key: SigningKey::random(&mut rng),
        }
    }

    /// Create from a 32-byte secret scalar.
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, CoreError> {
        let signing_key = SigningKey::from_bytes(seed.into())
            .map_err(|e| CoreError::InvalidKey(e.to_string()))?;
        Ok(Self { signing_key })
    }

    /// The EVM address derived from the public key.
    pub fn address(&self) -> Address {
        Address::from_public_key(self.signing_key.verifying_key())
    }

    /// Sign a 32-byte prehash, producing a low-`s` recoverable signature.
    pub fn sign_prehash(&self, prehash: &B256) -> Result<RecoverableSignature, CoreError> {
        let (signature, recid) = self
            .signing_key
            .sign_prehash_recoverable(prehash.as_slice())
            .map_err(|e| CoreError::InvalidKey(e.to_string()))?;

        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(RecoverableSignature::from_parts(r, s, 27 + recid.to_byte()))
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Keypair({})", self.address())
    }
}
