//! Chat message wire encoding.
//!
//! A [`ChatMessage`] is the structured payload carried by the mixnet
//! transport. The transport treats it as opaque bytes; this module owns
//! the CBOR encoding at both ends.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keys::{Identity, PublicKey};

/// Errors from encoding or decoding a [`ChatMessage`].
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// CBOR serialization failed.
    #[error("message encode failed: {0}")]
    Encode(String),

    /// CBOR deserialization failed. Inbound payloads that produce this are
    /// dropped individually; a corrupt payload never aborts a batch.
    #[error("message decode failed: {0}")]
    Decode(String),
}

/// A single chat message as it travels over the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message body. UTF-8 by convention, but never trusted to be.
    pub content: Vec<u8>,

    /// Sender's public key.
    pub sender_public_key: PublicKey,

    /// Public key of the sender's provider.
    pub sender_provider_key: PublicKey,

    /// Per-session outbound counter, strictly increasing from 1.
    pub nonce: i64,

    /// Sender's clock at send time, Unix nanoseconds.
    pub timestamp: i64,

    /// Message signature. Signing is not implemented upstream, so this is
    /// always `None` today; the field is carried for wire compatibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<u8>>,
}

impl ChatMessage {
    /// Encode the message to CBOR bytes for the transport.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut bytes = Vec::new();
        ciborium::into_writer(self, &mut bytes).map_err(|e| ProtocolError::Encode(e.to_string()))?;
        Ok(bytes)
    }

    /// Decode a message from CBOR bytes received off the transport.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Decode`] for any malformed input.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        ciborium::from_reader(bytes).map_err(|e| ProtocolError::Decode(e.to_string()))
    }

    /// The sender's identity handle, as used for alias resolution.
    pub fn sender(&self) -> Identity {
        Identity::new(self.sender_public_key, self.sender_provider_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_message() -> ChatMessage {
        ChatMessage {
            content: b"hello over the mixnet".to_vec(),
            sender_public_key: PublicKey::from_bytes(&[3u8; 32]).unwrap(),
            sender_provider_key: PublicKey::from_bytes(&[4u8; 32]).unwrap(),
            nonce: 1,
            timestamp: 1_700_000_000_000_000_000,
            signature: None,
        }
    }

    #[test]
    fn encode_decode_round_trip() {
        let original = test_message();
        let bytes = original.encode().unwrap();
        let decoded = ChatMessage::decode(&bytes).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn decode_rejects_truncated_payload() {
        let bytes = test_message().encode().unwrap();
        let truncated = &bytes[..bytes.len() / 2];
        assert!(matches!(ChatMessage::decode(truncated), Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(ChatMessage::decode(&[0xFF, 0x00, 0xAB]).is_err());
        assert!(ChatMessage::decode(&[]).is_err());
    }

    #[test]
    fn sender_pairs_both_keys() {
        let msg = test_message();
        let sender = msg.sender();
        assert_eq!(sender.public_key, msg.sender_public_key);
        assert_eq!(sender.provider_key, msg.sender_provider_key);
    }
}
