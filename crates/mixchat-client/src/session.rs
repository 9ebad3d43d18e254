//! Active conversation state.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mixchat_proto::Identity;

/// State for the single active one-on-one conversation.
///
/// Created when the user selects a conversation peer and replaced wholesale
/// when they switch. Cheaply cloneable; clones share the same state, so the
/// command handler and the send path see each other's updates. The mutex
/// serializes nonce increments, keeping the sequence gap-free.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
}

#[derive(Debug)]
struct SessionInner {
    recipient: Identity,
    alias: String,
    nonce: i64,
}

impl Session {
    /// Start a session with the given peer. The nonce starts at 0; the
    /// alias is whatever display name the peer currently resolves to.
    pub fn new(recipient: Identity, alias: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                recipient,
                alias: alias.into(),
                nonce: 0,
            })),
        }
    }

    /// Lock the session state, recovering from poisoning.
    ///
    /// A poisoned lock only means another thread panicked mid-update; the
    /// fields are plain values and stay usable.
    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The peer this session is talking to.
    pub fn recipient(&self) -> Identity {
        self.lock().recipient
    }

    /// The display alias currently shown for the peer.
    ///
    /// A redundant, UI-facing copy of one directory record; the directory
    /// stays authoritative.
    pub fn recipient_alias(&self) -> String {
        self.lock().alias.clone()
    }

    /// Overwrite the display alias.
    ///
    /// Does not touch the directory; callers that want persistence write
    /// through to the directory and cache themselves.
    pub fn update_alias(&self, alias: &str) {
        self.lock().alias = alias.to_string();
    }

    /// Pre-increment and return the outbound message counter.
    ///
    /// Strictly increasing and gap-free for the lifetime of the session;
    /// the first call returns 1. Never persisted.
    pub fn next_nonce(&self) -> i64 {
        let mut inner = self.lock();
        inner.nonce += 1;
        inner.nonce
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::from_bytes(&[1u8; 32], &[2u8; 32]).unwrap()
    }

    #[test]
    fn nonce_sequence_is_gap_free() {
        let session = Session::new(identity(), "peer");
        assert_eq!(session.next_nonce(), 1);
        assert_eq!(session.next_nonce(), 2);
        assert_eq!(session.next_nonce(), 3);
    }

    #[test]
    fn update_alias_overwrites_display_copy() {
        let session = Session::new(identity(), "??? - AQEBAQEB...");
        session.update_alias("alice");
        assert_eq!(session.recipient_alias(), "alice");

        session.update_alias("");
        assert_eq!(session.recipient_alias(), "");
    }

    #[test]
    fn clones_share_state() {
        let session = Session::new(identity(), "peer");
        let clone = session.clone();

        assert_eq!(session.next_nonce(), 1);
        assert_eq!(clone.next_nonce(), 2);

        clone.update_alias("alice");
        assert_eq!(session.recipient_alias(), "alice");
    }

    #[test]
    fn fresh_session_resets_nonce() {
        let session = Session::new(identity(), "peer");
        session.next_nonce();
        session.next_nonce();

        let replacement = Session::new(identity(), "peer");
        assert_eq!(replacement.next_nonce(), 1);
    }
}
