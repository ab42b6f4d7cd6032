//! Link signers.
//!
//! Two variants, chosen explicitly by the caller:
//!
//! - [`PlainKeySigner`]: the signer address is the key's own address and the
//!   key signs the payload hash directly.
//! - [`ContractWalletSigner`]: the signer address is a smart-contract wallet.
//!   The key signs a derived hash bound to the chain id and the wallet address,
//!   so the signature validates through the wallet's on-chain verification
//!   entry point rather than a raw key-address match.

use alloy_primitives::{Address, Bytes, B256};

use crate::crypto::{hash, Keypair};
use crate::error::CoreError;

/// Domain type string for contract-wallet message hashes.
pub const DOMAIN_TYPE: &str = "EIP712Domain(uint256 chainId,address verifyingContract)";

/// Message type string for contract-wallet message hashes.
pub const MESSAGE_TYPE: &str = "CatenaMessage(bytes32 hash)";

/// Compute the domain separator for a wallet on a chain.
pub fn domain_separator(chain_id: u64, wallet: &Address) -> B256 {
    let mut chain_word = [0u8; 32];
    chain_word[24..].copy_from_slice(&chain_id.to_be_bytes());

    let mut data = Vec::with_capacity(96);
    data.extend_from_slice(hash(DOMAIN_TYPE.as_bytes()).as_slice());
    data.extend_from_slice(&chain_word);
    data.extend_from_slice(wallet.into_word().as_slice());
    hash(&data)
}

/// The hash a wallet's owner key signs for a given payload hash.
///
/// `keccak256(0x19 0x01 || domain_separator || keccak256(MESSAGE_TYPEHASH || payload_hash))`
pub fn wallet_message_hash(payload_hash: &B256, chain_id: u64, wallet: &Address) -> B256 {
    let mut struct_data = Vec::with_capacity(64);
    struct_data.extend_from_slice(hash(MESSAGE_TYPE.as_bytes()).as_slice());
    struct_data.extend_from_slice(payload_hash.as_slice());
    let struct_hash = hash(&struct_data);

    let mut data = Vec::with_capacity(66);
    data.extend_from_slice(&[0x19, 0x01]);
    data.extend_from_slice(domain_separator(chain_id, wallet).as_slice());
    data.extend_from_slice(struct_hash.as_slice());
    hash(&data)
}

/// Signs payload hashes with a plain key.
#[derive(Debug, Clone)]
pub struct PlainKeySigner {
    keypair: Keypair,
}

impl PlainKeySigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    pub fn address(&self) -> Address {
        self.keypair.address()
    }

    pub fn sign_hash(&self, payload_hash: &B256) -> Result<Bytes, CoreError> {
        let sig = self.keypair.sign_prehash(payload_hash)?;
        Ok(Bytes::copy_from_slice(&sig.to_bytes()))
    }
}

/// Signs on behalf of a contract wallet whose owner holds `keypair`.
#[derive(Debug, Clone)]
pub struct ContractWalletSigner {
    keypair: Keypair,
    wallet: Address,
    chain_id: u64,
}

impl ContractWalletSigner {
    pub fn new(keypair: Keypair, wallet: Address, chain_id: u64) -> Self {
        Self {
            keypair,
            wallet,
            chain_id,
        }
    }

    /// The wallet address, not the owner key's address.
    pub fn address(&self) -> Address {
        self.wallet
    }

    /// The owner key's address.
    pub fn owner(&self) -> Address {
        self.keypair.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn sign_hash(&self, payload_hash: &B256) -> Result<Bytes, CoreError> {
        let derived = wallet_message_hash(payload_hash, self.chain_id, &self.wallet);
        let sig = self.keypair.sign_prehash(&derived)?;
        Ok(Bytes::copy_from_slice(&sig.to_bytes()))
    }
}

/// The signer variant used for a link.
#[derive(Debug, Clone)]
pub enum LinkSigner {
    PlainKey(PlainKeySigner),
    ContractWallet(ContractWalletSigner),
}

impl LinkSigner {
    /// Plain-key signer for a keypair.
    pub fn plain(keypair: Keypair) -> Self {
        Self::PlainKey(PlainKeySigner::new(keypair))
    }

    /// Contract-wallet signer for a wallet owned by `keypair`.
    pub fn contract_wallet(keypair: Keypair, wallet: Address, chain_id: u64) -> Self {
        Self::ContractWallet(ContractWalletSigner::new(keypair, wallet, chain_id))
    }

    /// The address stamped into `signerAddress`.
    pub fn address(&self) -> Address {
        match self {
            Self::PlainKey(s) => s.address(),
            Self::ContractWallet(s) => s.address(),
        }
    }

    /// Sign a payload hash.
    pub fn sign_hash(&self, payload_hash: &B256) -> Result<Bytes, CoreError> {
        match self {
            Self::PlainKey(s) => s.sign_hash(payload_hash),
            Self::ContractWallet(s) => s.sign_hash(payload_hash),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::RecoverableSignature;

    #[test]
    fn test_plain_signer_recovers_to_own_address() {
        let signer = LinkSigner::plain(Keypair::from_seed(&[0x01; 32]).unwrap());
        let payload_hash = hash(b"payload");
        let sig = signer.sign_hash(&payload_hash).unwrap();

        let parsed = RecoverableSignature::from_slice(&sig).unwrap();
        assert_eq!(parsed.recover_address(&payload_hash).unwrap(), signer.address());
    }

    #[test]
    fn test_wallet_signer_uses_wallet_address() {
        let owner = Keypair::from_seed(&[0x02; 32]).unwrap();
        let wallet = Address::repeat_byte(0x77);
        let signer = ContractWalletSigner::new(owner.clone(), wallet, 1);

        assert_eq!(signer.address(), wallet);
        assert_eq!(signer.owner(), owner.address());

        // The raw payload hash does not recover to either address
        let payload_hash = hash(b"payload");
        let sig = signer.sign_hash(&payload_hash).unwrap();
        let parsed = RecoverableSignature::from_slice(&sig).unwrap();
        let recovered = parsed.recover_address(&payload_hash).ok();
        assert_ne!(recovered, Some(wallet));
        assert_ne!(recovered, Some(owner.address()));

        // The derived hash recovers to the owner
        let derived = wallet_message_hash(&payload_hash, 1, &wallet);
        assert_eq!(parsed.recover_address(&derived).unwrap(), owner.address());
    }

    #[test]
    fn test_domain_separator_binds_chain_and_wallet() {
        let wallet = Address::repeat_byte(0x77);
        let base = domain_separator(1, &wallet);
        assert_ne!(base, domain_separator(2, &wallet));
        assert_ne!(base, domain_separator(1, &Address::repeat_byte(0x78)));
    }
}
