//! Signature verification for plain-key and contract-backed identities.
//!
//! The claimed address is classified once by whether it has code, and the
//! result is cached. Plain-key addresses verify by public-key recovery with a
//! low-`s` guard. Contract addresses verify through their on-chain entry
//! point, trying each [`Convention`] in hint order.

use alloy_primitives::{Address, B256};
use tracing::debug;

use catena_core::crypto::SIGNATURE_LEN;
use catena_core::{Link, RecoverableSignature};
use catena_store::ChainReader;

use crate::cache::{SoftCache, DEFAULT_CACHE_CAPACITY};
use crate::convention::{AccountKind, Convention, Verdict};
use crate::error::{Result, VerifyError};

/// Configuration for the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Soft capacity of the account-kind and convention-hint caches.
    pub cache_capacity: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

/// Verifies link signatures against claimed identities.
pub struct SignatureVerifier<C> {
    chain: C,
    kinds: SoftCache<Address, AccountKind>,
    hints: SoftCache<Address, Convention>,
}

impl<C: ChainReader> SignatureVerifier<C> {
    pub fn new(chain: C) -> Self {
        Self::with_config(chain, VerifierConfig::default())
    }

    pub fn with_config(chain: C, config: VerifierConfig) -> Self {
        Self {
            chain,
            kinds: SoftCache::new(config.cache_capacity),
            hints: SoftCache::new(config.cache_capacity),
        }
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// Verify `signature` over `hash` for `claimed`.
    pub async fn verify(&self, hash: &B256, claimed: &Address, signature: &[u8]) -> Result<bool> {
        self.verify_with_payload(hash, None, claimed, signature).await
    }

    /// Verify with the raw payload available for the raw-bytes convention.
    pub async fn verify_with_payload(
        &self,
        hash: &B256,
        payload: Option<&[u8]>,
        claimed: &Address,
        signature: &[u8],
    ) -> Result<bool> {
        if claimed.is_zero() {
            return Err(VerifyError::ZeroAddress);
        }
        if signature.is_empty() {
            return Err(VerifyError::MalformedSignature(0));
        }

        match self.account_kind(claimed).await? {
            AccountKind::PlainKey => verify_plain(hash, claimed, signature),
            AccountKind::Contract => self.verify_contract(hash, payload, claimed, signature).await,
        }
    }

    /// Verify a link's signature over its canonical signing bytes.
    pub async fn verify_link(&self, link: &Link) -> Result<bool> {
        let payload = link.signing_bytes()?;
        let hash = catena_core::hash(&payload);
        self.verify_with_payload(&hash, Some(payload.as_slice()), &link.signer_address, &link.signature)
            .await
    }

    /// Classify an address, consulting the cache first.
    pub async fn account_kind(&self, address: &Address) -> Result<AccountKind> {
        if let Some(kind) = self.kinds.get(address) {
            return Ok(kind);
        }
        let code = self.chain.get_code(address).await?;
        let kind = AccountKind::from_code(&code);
        debug!(address = %address, ?kind, "classified account");
        self.kinds.insert(*address, kind);
        Ok(kind)
    }

    /// The convention that last succeeded for an address.
    pub fn convention_hint(&self, address: &Address) -> Option<Convention> {
        self.hints.get(address)
    }

    async fn verify_contract(
        &self,
        hash: &B256,
        payload: Option<&[u8]>,
        wallet: &Address,
        signature: &[u8],
    ) -> Result<bool> {
        let mut definite = false;

        for convention in Convention::ordered(self.hints.get(wallet)) {
            let Some(data) = convention.encode_call(hash, payload, signature) else {
                continue;
            };

            let verdict = match self.chain.call(wallet, data).await {
                Ok(outcome) => convention.verdict(&outcome),
                Err(e) => {
                    debug!(wallet = %wallet, ?convention, error = %e, "wallet call failed");
                    Verdict::Inconclusive
                }
            };
            debug!(wallet = %wallet, ?convention, ?verdict, "wallet verification attempt");

            match verdict {
                Verdict::Valid => {
                    self.hints.insert(*wallet, convention);
                    return Ok(true);
                }
                Verdict::Invalid => definite = true,
                Verdict::Inconclusive => {}
            }
        }

        if definite {
            Ok(false)
        } else {
            Err(VerifyError::Inconclusive(*wallet))
        }
    }
}

/// Recover and compare. High-`s` signatures are rejected.
fn verify_plain(hash: &B256, claimed: &Address, signature: &[u8]) -> Result<bool> {
    if signature.len() != SIGNATURE_LEN {
        return Err(VerifyError::MalformedSignature(signature.len()));
    }
    let sig = RecoverableSignature::from_slice(signature)?;
    if !sig.is_low_s() {
        return Ok(false);
    }
    Ok(sig.recover_address(hash).map_or(false, |a| a == *claimed))
}
