//! Public key material and identity handles.
//!
//! Keys are opaque fixed-size byte strings; this crate never interprets
//! them cryptographically. Equality, ordering, and hashing are plain byte
//! comparisons, which is what the directory key encoding relies on.

use base64::{Engine, engine::general_purpose::URL_SAFE as BASE64URL};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size in bytes of a single public key component.
///
/// Both the peer key and the provider key have this exact length; the
/// directory and cache key encodings depend on it being fixed.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Errors produced when constructing key material from untrusted input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// Raw byte input had the wrong length.
    #[error("invalid key length: expected {expected}, got {got}")]
    InvalidLength {
        /// Required key length in bytes.
        expected: usize,
        /// Length that was actually supplied.
        got: usize,
    },

    /// Base64url decoding of a textual key failed.
    #[error("invalid base64 key encoding: {0}")]
    Base64(String),

    /// A composite key encoding (e.g. a cache key) was structurally broken.
    #[error("malformed key encoding: {0}")]
    Malformed(String),
}

/// An opaque fixed-size public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Wrap an exact-size byte array as a key.
    pub fn new(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Construct a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidLength`] unless `bytes` is exactly
    /// [`PUBLIC_KEY_SIZE`] bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyError> {
        let array: [u8; PUBLIC_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| KeyError::InvalidLength { expected: PUBLIC_KEY_SIZE, got: bytes.len() })?;
        Ok(Self(array))
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Base64url (padded) rendition of the key, as shared between users.
    pub fn to_base64(self) -> String {
        BASE64URL.encode(self.0)
    }

    /// Parse a base64url-encoded key.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Base64`] if the text is not valid base64url, or
    /// [`KeyError::InvalidLength`] if the decoded bytes have the wrong size.
    pub fn from_base64(text: &str) -> Result<Self, KeyError> {
        let bytes = BASE64URL.decode(text).map_err(|e| KeyError::Base64(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

/// The identity handle of a chat peer: its public key paired with the
/// public key of the provider it is reachable through.
///
/// Two handles are equal iff both components are byte-equal. Handles are
/// derived on demand from wire or config data and have no lifecycle of
/// their own.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Identity {
    /// The peer's own public key.
    pub public_key: PublicKey,
    /// The public key of the peer's provider.
    pub provider_key: PublicKey,
}

impl Identity {
    /// Pair two keys into an identity handle.
    pub fn new(public_key: PublicKey, provider_key: PublicKey) -> Self {
        Self { public_key, provider_key }
    }

    /// Construct an identity from two raw byte strings.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidLength`] if either component has the
    /// wrong size.
    pub fn from_bytes(peer: &[u8], provider: &[u8]) -> Result<Self, KeyError> {
        Ok(Self { public_key: PublicKey::from_bytes(peer)?, provider_key: PublicKey::from_bytes(provider)? })
    }

    /// Construct an identity from two base64url-encoded keys, as supplied
    /// in user commands.
    ///
    /// # Errors
    ///
    /// Returns a [`KeyError`] if either component fails to decode or has
    /// the wrong size.
    pub fn from_base64(peer: &str, provider: &str) -> Result<Self, KeyError> {
        Ok(Self {
            public_key: PublicKey::from_base64(peer)?,
            provider_key: PublicKey::from_base64(provider)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_bytes_rejects_wrong_length() {
        let result = PublicKey::from_bytes(&[1u8; 31]);
        assert_eq!(result, Err(KeyError::InvalidLength { expected: 32, got: 31 }));

        let result = PublicKey::from_bytes(&[1u8; 33]);
        assert_eq!(result, Err(KeyError::InvalidLength { expected: 32, got: 33 }));
    }

    #[test]
    fn base64_round_trip() {
        let key = PublicKey::from_bytes(&[7u8; 32]).unwrap();
        let encoded = key.to_base64();
        // 32 bytes encode to 44 base64 characters (with padding)
        assert_eq!(encoded.len(), 44);
        assert_eq!(PublicKey::from_base64(&encoded).unwrap(), key);
    }

    #[test]
    fn from_base64_rejects_garbage() {
        assert!(matches!(PublicKey::from_base64("not base64!!"), Err(KeyError::Base64(_))));
        // Valid base64 but wrong decoded length
        assert!(matches!(
            PublicKey::from_base64("aGVsbG8="),
            Err(KeyError::InvalidLength { .. })
        ));
    }

    #[test]
    fn identity_equality_is_componentwise() {
        let a = Identity::from_bytes(&[1u8; 32], &[2u8; 32]).unwrap();
        let b = Identity::from_bytes(&[1u8; 32], &[2u8; 32]).unwrap();
        let c = Identity::from_bytes(&[2u8; 32], &[1u8; 32]).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn identity_from_base64_rejects_bad_component() {
        let good = PublicKey::from_bytes(&[9u8; 32]).unwrap().to_base64();
        assert!(Identity::from_base64(&good, "???").is_err());
        assert!(Identity::from_base64("???", &good).is_err());
    }
}
