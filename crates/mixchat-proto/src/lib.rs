//! Wire types and identity handles for the mixchat client.
//!
//! This crate owns the vocabulary shared by the alias directory and the
//! client: fixed-size public keys, the (peer, provider) identity handle
//! that names a chat contact, and the CBOR chat message that travels over
//! the mixnet transport.
//!
//! The transport itself is an external collaborator; this crate only
//! defines what it carries.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod keys;
mod message;

pub use keys::{Identity, KeyError, PUBLIC_KEY_SIZE, PublicKey};
pub use message::{ChatMessage, ProtocolError};
