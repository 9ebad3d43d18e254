//! Directory key encoding.
//!
//! Every alias record is keyed by `ALIAS_PREFIX || peer_key || provider_key`.
//! The prefix namespaces alias records inside the store; the two key
//! components follow in order, so lexicographic key order sorts by peer
//! key first, then provider key.

use mixchat_proto::{Identity, PUBLIC_KEY_SIZE, PublicKey};

use crate::DirectoryError;

/// Namespace tag prefixed to every alias record key.
pub const ALIAS_PREFIX: &[u8] = b"ALIAS";

/// Exact length of an encoded alias key.
pub const ALIAS_KEY_LEN: usize = ALIAS_PREFIX.len() + 2 * PUBLIC_KEY_SIZE;

/// Encode an identity handle as a directory key.
///
/// Layout: `[prefix: 5 bytes][peer key: 32 bytes][provider key: 32 bytes]`.
/// Deterministic: equal identities always produce equal keys.
pub fn encode_alias_key(identity: &Identity) -> [u8; ALIAS_KEY_LEN] {
    let mut key = [0u8; ALIAS_KEY_LEN];
    key[..ALIAS_PREFIX.len()].copy_from_slice(ALIAS_PREFIX);

    let mut offset = ALIAS_PREFIX.len();
    key[offset..offset + PUBLIC_KEY_SIZE].copy_from_slice(identity.public_key.as_bytes());
    offset += PUBLIC_KEY_SIZE;
    key[offset..].copy_from_slice(identity.provider_key.as_bytes());

    key
}

/// Decode a directory key back to the identity handle it names.
///
/// # Errors
///
/// Returns [`DirectoryError::InvalidKey`] unless the key is exactly
/// [`ALIAS_KEY_LEN`] bytes, or [`DirectoryError::Corrupt`] if the prefix
/// does not match. Callers treat either as an absent or corrupt record.
pub fn decode_alias_key(key: &[u8]) -> Result<Identity, DirectoryError> {
    if key.len() != ALIAS_KEY_LEN {
        return Err(DirectoryError::InvalidKey { expected: ALIAS_KEY_LEN, got: key.len() });
    }
    if !key.starts_with(ALIAS_PREFIX) {
        return Err(DirectoryError::Corrupt("alias key prefix mismatch".to_string()));
    }

    let offset = ALIAS_PREFIX.len();
    let public_key = PublicKey::from_bytes(&key[offset..offset + PUBLIC_KEY_SIZE])
        .map_err(|e| DirectoryError::Corrupt(e.to_string()))?;
    let provider_key = PublicKey::from_bytes(&key[offset + PUBLIC_KEY_SIZE..])
        .map_err(|e| DirectoryError::Corrupt(e.to_string()))?;

    Ok(Identity::new(public_key, provider_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(peer: u8, provider: u8) -> Identity {
        Identity::from_bytes(&[peer; 32], &[provider; 32]).unwrap()
    }

    #[test]
    fn key_round_trip() {
        let id = identity(0xAB, 0xCD);
        let key = encode_alias_key(&id);
        assert_eq!(key.len(), ALIAS_KEY_LEN);
        assert_eq!(decode_alias_key(&key).unwrap(), id);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let key = encode_alias_key(&identity(1, 2));

        let result = decode_alias_key(&key[..key.len() - 1]);
        assert_eq!(
            result,
            Err(DirectoryError::InvalidKey { expected: ALIAS_KEY_LEN, got: ALIAS_KEY_LEN - 1 })
        );

        let mut long = key.to_vec();
        long.push(0);
        assert!(decode_alias_key(&long).is_err());
    }

    #[test]
    fn decode_rejects_wrong_prefix() {
        let mut key = encode_alias_key(&identity(1, 2));
        key[0] = b'X';
        assert!(matches!(decode_alias_key(&key), Err(DirectoryError::Corrupt(_))));
    }

    #[test]
    fn key_order_sorts_by_peer_then_provider() {
        let a = encode_alias_key(&identity(1, 9));
        let b = encode_alias_key(&identity(2, 0));
        let c = encode_alias_key(&identity(2, 1));

        assert!(a < b);
        assert!(b < c);
    }
}
