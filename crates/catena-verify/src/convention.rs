//! Account kinds and contract verification conventions.

use alloy_primitives::{Bytes as AbiBytes, B256};
use alloy_sol_types::SolCall;
use bytes::Bytes;

use catena_store::abi::{IERC1271, IERC1271Bytes, MAGIC_HASH32, MAGIC_RAW_BYTES};
use catena_store::CallOutcome;

/// How an address proves signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountKind {
    /// No code: the address is derived from a single key.
    PlainKey,
    /// Has code: validity is defined by the contract.
    Contract,
}

impl AccountKind {
    pub fn from_code(code: &[u8]) -> Self {
        if code.is_empty() {
            Self::PlainKey
        } else {
            Self::Contract
        }
    }
}

/// A contract verification entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Convention {
    /// `isValidSignature(bytes32,bytes)`
    Hash32,
    /// `isValidSignature(bytes,bytes)`
    RawBytes,
}

impl Convention {
    /// Default trial order.
    pub const ALL: [Convention; 2] = [Convention::Hash32, Convention::RawBytes];

    pub fn magic(self) -> [u8; 4] {
        match self {
            Self::Hash32 => MAGIC_HASH32,
            Self::RawBytes => MAGIC_RAW_BYTES,
        }
    }

    /// Trial order with `hint` first.
    pub fn ordered(hint: Option<Convention>) -> [Convention; 2] {
        match hint {
            Some(Self::RawBytes) => [Self::RawBytes, Self::Hash32],
            _ => Self::ALL,
        }
    }

    /// ABI-encode the call. `RawBytes` needs the payload.
    pub fn encode_call(self, hash: &B256, payload: Option<&[u8]>, signature: &[u8]) -> Option<Bytes> {
        let signature = AbiBytes::copy_from_slice(signature);
        let data = match self {
            Self::Hash32 => IERC1271::isValidSignatureCall {
                hash: *hash,
                signature,
            }
            .abi_encode(),
            Self::RawBytes => IERC1271Bytes::isValidSignatureCall {
                data: AbiBytes::copy_from_slice(payload?),
                signature,
            }
            .abi_encode(),
        };
        Some(Bytes::from(data))
    }

    /// Interpret a call outcome.
    pub fn verdict(self, outcome: &CallOutcome) -> Verdict {
        if outcome.reverted {
            return Verdict::Invalid;
        }
        if outcome.return_data.len() < 4 {
            return Verdict::Inconclusive;
        }
        if outcome.return_data[..4] == self.magic() {
            Verdict::Valid
        } else {
            Verdict::Invalid
        }
    }
}

/// Result of one convention attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// Revert or a non-magic return value.
    Invalid,
    /// Transport failure, or empty or short return data.
    Inconclusive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_code() {
        assert_eq!(AccountKind::from_code(&[]), AccountKind::PlainKey);
        assert_eq!(AccountKind::from_code(&[0x60]), AccountKind::Contract);
    }

    #[test]
    fn test_ordered_by_hint() {
        assert_eq!(Convention::ordered(None), Convention::ALL);
        assert_eq!(
            Convention::ordered(Some(Convention::RawBytes)),
            [Convention::RawBytes, Convention::Hash32]
        );
    }

    #[test]
    fn test_encode_call_selectors() {
        let data = Convention::Hash32
            .encode_call(&B256::ZERO, None, &[1; 65])
            .unwrap();
        assert_eq!(&data[..4], &MAGIC_HASH32);

        assert!(Convention::RawBytes.encode_call(&B256::ZERO, None, &[1; 65]).is_none());
        let data = Convention::RawBytes
            .encode_call(&B256::ZERO, Some(&b"payload"[..]), &[1; 65])
            .unwrap();
        assert_eq!(&data[..4], &MAGIC_RAW_BYTES);
    }

    #[test]
    fn test_verdicts() {
        let conv = Convention::Hash32;
        assert_eq!(conv.verdict(&CallOutcome::revert()), Verdict::Invalid);
        assert_eq!(conv.verdict(&CallOutcome::success(Bytes::new())), Verdict::Inconclusive);
        assert_eq!(conv.verdict(&CallOutcome::success(vec![0x16u8, 0x26])), Verdict::Inconclusive);

        let mut word = vec![0u8; 32];
        word[..4].copy_from_slice(&MAGIC_HASH32);
        assert_eq!(conv.verdict(&CallOutcome::success(word.clone())), Verdict::Valid);
        assert_eq!(Convention::RawBytes.verdict(&CallOutcome::success(word)), Verdict::Invalid);
    }
}
