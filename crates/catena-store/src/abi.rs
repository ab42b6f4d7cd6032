//! Contract-wallet verification entry points.
//!
//! Two conventions exist in the wild. Each returns its own selector as the
//! "valid" magic value.

use alloy_sol_types::{sol, SolCall};

sol! {
    /// Fixed-size hash input.
    interface IERC1271 {
        function isValidSignature(bytes32 hash, bytes signature) external view returns (bytes4 magicValue);
    }

    /// Arbitrary-length payload input.
    interface IERC1271Bytes {
        function isValidSignature(bytes data, bytes signature) external view returns (bytes4 magicValue);
    }
}

/// `isValidSignature(bytes32,bytes)` magic value, `0x1626ba7e`.
pub const MAGIC_HASH32: [u8; 4] = IERC1271::isValidSignatureCall::SELECTOR;

/// `isValidSignature(bytes,bytes)` magic value, `0x20c13b0b`.
pub const MAGIC_RAW_BYTES: [u8; 4] = IERC1271Bytes::isValidSignatureCall::SELECTOR;

/// ABI-encode a `bytes4` return value (left-aligned in one word).
pub fn encode_magic(magic: [u8; 4]) -> Vec<u8> {
    let mut word = vec![0u8; 32];
    word[..4].copy_from_slice(&magic);
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_values() {
        assert_eq!(MAGIC_HASH32, [0x16, 0x26, 0xba, 0x7e]);
        assert_eq!(MAGIC_RAW_BYTES, [0x20, 0xc1, 0x3b, 0x0b]);
    }

    #[test]
    fn test_encode_magic_left_aligned() {
        let word = encode_magic(MAGIC_HASH32);
        assert_eq!(word.len(), 32);
        assert_eq!(&word[..4], &MAGIC_HASH32);
        assert!(word[4..].iter().all(|b| *b == 0));
    }
}
