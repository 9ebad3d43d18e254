//! Mixnet transport collaborator contract.
//!
//! The transport owns packet construction, routing, and delivery; the
//! client only ever hands it opaque payloads and drains its local receive
//! buffer. Nothing here performs network I/O.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use bytes::Bytes;
use mixchat_proto::{Identity, PublicKey};
use thiserror::Error;

/// Errors surfaced by the transport collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport could not accept the outbound payload.
    #[error("transport send failed: {0}")]
    Send(String),
}

/// The narrow slice of the mixnet client the core depends on.
pub trait Transport: Send + Sync + 'static {
    /// Drain the transport's local receive buffer.
    ///
    /// Non-blocking: returns whatever opaque payloads have already been
    /// buffered, possibly none. Issues no network call.
    fn drain_received(&self) -> Vec<Bytes>;

    /// Hand an opaque payload to the transport for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the payload was not accepted.
    fn send(&self, payload: Bytes, recipient: &Identity) -> Result<(), TransportError>;

    /// Our own public key, stamped into outbound messages.
    fn own_public_key(&self) -> PublicKey;

    /// Our provider's public key, stamped into outbound messages.
    fn provider_public_key(&self) -> PublicKey;
}

/// In-memory transport for tests and single-process simulation.
///
/// Payloads are queued with [`LoopbackTransport::inject`] and drained like
/// a real receive buffer. In echo mode every sent payload is looped back
/// into the inbound queue, which makes a single client self-contained.
/// Thread-safe through Mutex, but uses `lock().expect()` which will panic
/// if the mutex is poisoned - acceptable for test/simulation code.
#[derive(Clone)]
pub struct LoopbackTransport {
    inner: Arc<Mutex<LoopbackInner>>,
    public_key: PublicKey,
    provider_key: PublicKey,
    echo: bool,
}

struct LoopbackInner {
    inbound: VecDeque<Bytes>,
    sent: Vec<(Bytes, Identity)>,
}

impl LoopbackTransport {
    /// Create a loopback transport with the given own-key material.
    pub fn new(public_key: PublicKey, provider_key: PublicKey) -> Self {
        Self {
            inner: Arc::new(Mutex::new(LoopbackInner {
                inbound: VecDeque::new(),
                sent: Vec::new(),
            })),
            public_key,
            provider_key,
            echo: false,
        }
    }

    /// Create a loopback transport that echoes sent payloads back into the
    /// inbound queue.
    pub fn with_echo(public_key: PublicKey, provider_key: PublicKey) -> Self {
        Self { echo: true, ..Self::new(public_key, provider_key) }
    }

    /// Queue a payload as if it had arrived off the mixnet.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test/simulation code.
    #[allow(clippy::expect_used)]
    pub fn inject(&self, payload: Bytes) {
        self.inner.lock().expect("Mutex poisoned").inbound.push_back(payload);
    }

    /// Every payload handed to [`Transport::send`], in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test/simulation code.
    #[allow(clippy::expect_used)]
    pub fn sent(&self) -> Vec<(Bytes, Identity)> {
        self.inner.lock().expect("Mutex poisoned").sent.clone()
    }
}

impl Transport for LoopbackTransport {
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test/simulation code.
    #[allow(clippy::expect_used)]
    fn drain_received(&self) -> Vec<Bytes> {
        self.inner.lock().expect("Mutex poisoned").inbound.drain(..).collect()
    }

    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned. This is acceptable for
    /// test/simulation code.
    #[allow(clippy::expect_used)]
    fn send(&self, payload: Bytes, recipient: &Identity) -> Result<(), TransportError> {
        let mut inner = self.inner.lock().expect("Mutex poisoned");
        if self.echo {
            inner.inbound.push_back(payload.clone());
        }
        inner.sent.push((payload, *recipient));
        Ok(())
    }

    fn own_public_key(&self) -> PublicKey {
        self.public_key
    }

    fn provider_public_key(&self) -> PublicKey {
        self.provider_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> (PublicKey, PublicKey) {
        (
            PublicKey::from_bytes(&[1u8; 32]).unwrap(),
            PublicKey::from_bytes(&[2u8; 32]).unwrap(),
        )
    }

    #[test]
    fn drain_empties_the_buffer() {
        let (pk, prov) = keys();
        let transport = LoopbackTransport::new(pk, prov);

        transport.inject(Bytes::from_static(b"one"));
        transport.inject(Bytes::from_static(b"two"));

        let drained = transport.drain_received();
        assert_eq!(drained.len(), 2);
        assert!(transport.drain_received().is_empty());
    }

    #[test]
    fn echo_mode_loops_sends_back() {
        let (pk, prov) = keys();
        let transport = LoopbackTransport::with_echo(pk, prov);
        let recipient = Identity::new(pk, prov);

        transport.send(Bytes::from_static(b"hi"), &recipient).unwrap();

        assert_eq!(transport.sent().len(), 1);
        assert_eq!(transport.drain_received(), vec![Bytes::from_static(b"hi")]);
    }

    #[test]
    fn plain_mode_does_not_echo() {
        let (pk, prov) = keys();
        let transport = LoopbackTransport::new(pk, prov);
        let recipient = Identity::new(pk, prov);

        transport.send(Bytes::from_static(b"hi"), &recipient).unwrap();
        assert!(transport.drain_received().is_empty());
    }
}
