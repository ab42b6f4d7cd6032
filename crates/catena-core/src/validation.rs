//! Structural validation of links and identifiers.
//!
//! These checks run before any I/O. Signature validity is not checked here;
//! that needs chain access and lives in the verifier.

use std::str::FromStr;

use alloy_primitives::Address;

use crate::error::ValidationError;
use crate::link::Link;
use crate::types::ContentAddress;

/// Maximum link name length in bytes.
pub const MAX_NAME_LEN: usize = 256;

/// Maximum nonce length in characters.
pub const MAX_NONCE_LEN: usize = 128;

/// Validate a link's shape.
///
/// With `require_signature`, an unsigned link is rejected too.
pub fn validate_link(link: &Link, require_signature: bool) -> Result<(), ValidationError> {
    validate_name(&link.name)?;

    if link.nonce.is_empty() {
        return Err(ValidationError::EmptyNonce);
    }
    if link.nonce.chars().count() > MAX_NONCE_LEN {
        return Err(ValidationError::NonceTooLong { max: MAX_NONCE_LEN });
    }

    if link.signer_address.is_zero() {
        return Err(ValidationError::ZeroAddress);
    }

    if link.signed_at < 0 {
        return Err(ValidationError::NegativeTimestamp(link.signed_at));
    }

    if require_signature && !link.is_signed() {
        return Err(ValidationError::MissingSignature);
    }

    Ok(())
}

/// Validate a logical link name.
pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong { max: MAX_NAME_LEN });
    }
    if name.chars().any(char::is_control) {
        return Err(ValidationError::NameControlChar);
    }
    Ok(())
}

/// Validate a namespace key.
pub fn validate_namespace_key(key: &str) -> Result<(), ValidationError> {
    if key.trim().is_empty() {
        return Err(ValidationError::EmptyNamespaceKey);
    }
    Ok(())
}

/// Parse an identity address. The zero address is rejected.
pub fn parse_address(s: &str) -> Result<Address, ValidationError> {
    let address =
        Address::from_str(s.trim()).map_err(|e| ValidationError::InvalidAddress(e.to_string()))?;
    require_identity(&address)?;
    Ok(address)
}

/// Reject the zero address where an identity is required.
pub fn require_identity(address: &Address) -> Result<(), ValidationError> {
    if address.is_zero() {
        return Err(ValidationError::ZeroAddress);
    }
    Ok(())
}

/// Parse a content address (exactly 64 hex characters).
pub fn parse_content_address(s: &str) -> Result<ContentAddress, ValidationError> {
    ContentAddress::from_hex(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::link::LinkBuilder;
    use crate::signer::LinkSigner;

    fn make_link() -> Link {
        let signer = LinkSigner::plain(Keypair::from_seed(&[0x42; 32]).unwrap());
        LinkBuilder::new("items/cup", ContentAddress::digest(b"cup"), 1)
            .signed_at(1736870400000)
            .sign(&signer)
            .unwrap()
    }

    #[test]
    fn test_valid_link() {
        assert!(validate_link(&make_link(), true).is_ok());
    }

    #[test]
    fn test_name_rules() {
        let mut link = make_link();
        link.name = String::new();
        assert_eq!(validate_link(&link, false), Err(ValidationError::EmptyName));

        link.name = "a".repeat(MAX_NAME_LEN + 1);
        assert_eq!(
            validate_link(&link, false),
            Err(ValidationError::NameTooLong { max: MAX_NAME_LEN })
        );

        link.name = "items/\ncup".into();
        assert_eq!(validate_link(&link, false), Err(ValidationError::NameControlChar));
    }

    #[test]
    fn test_nonce_rules() {
        let mut link = make_link();
        link.nonce = String::new();
        assert_eq!(validate_link(&link, false), Err(ValidationError::EmptyNonce));

        link.nonce = "x".repeat(MAX_NONCE_LEN + 1);
        assert!(matches!(
            validate_link(&link, false),
            Err(ValidationError::NonceTooLong { .. })
        ));
    }

    #[test]
    fn test_zero_signer_and_negative_time() {
        let mut link = make_link();
        link.signer_address = Address::ZERO;
        assert_eq!(validate_link(&link, false), Err(ValidationError::ZeroAddress));

        let mut link = make_link();
        link.signed_at = -1;
        assert_eq!(
            validate_link(&link, false),
            Err(ValidationError::NegativeTimestamp(-1))
        );
    }

    #[test]
    fn test_missing_signature() {
        let mut link = make_link();
        link.signature = Default::default();
        assert!(validate_link(&link, false).is_ok());
        assert_eq!(validate_link(&link, true), Err(ValidationError::MissingSignature));
    }

    #[test]
    fn test_parse_address() {
        let addr = parse_address("0x00000000000000000000000000000000000000aa").unwrap();
        assert_eq!(addr, Address::with_last_byte(0xaa));
        assert_eq!(
            parse_address("0x0000000000000000000000000000000000000000"),
            Err(ValidationError::ZeroAddress)
        );
        assert!(matches!(
            parse_address("not an address"),
            Err(ValidationError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_parse_content_address() {
        let hex = "ab".repeat(32);
        assert!(parse_content_address(&hex).is_ok());
        assert!(parse_content_address(&hex[..62]).is_err());
        assert!(parse_content_address(&format!("0x{}", &hex[..62])).is_err());
        assert!(parse_content_address(&"zz".repeat(32)).is_err());
    }

    #[test]
    fn test_namespace_key() {
        assert!(validate_namespace_key("market").is_ok());
        assert_eq!(validate_namespace_key("  "), Err(ValidationError::EmptyNamespaceKey));
    }
}
