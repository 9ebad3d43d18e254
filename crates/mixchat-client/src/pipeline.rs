//! Message resolution pipeline.
//!
//! One pipeline task runs per active session. On a fixed interval it
//! drains the transport's receive buffer, decodes each opaque payload into
//! a chat message, resolves the sender's display name (cache, then
//! directory, then a synthesized fallback), and emits the result to the
//! display.
//!
//! Batches are emitted in arrival order; the mixnet gives no ordering
//! guarantee relative to send order and none is imposed here.

use std::{sync::Arc, time::Duration};

use mixchat_proto::{ChatMessage, Identity, PublicKey};
use mixchat_store::AliasDirectory;
use tokio::sync::watch;

use crate::{AliasCache, DisplaySink, Transport};

/// Fixed wait between drains of the receive buffer. No backoff.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Textual prefix of the synthesized display name for peers without an
/// alias.
const UNKNOWN_SENDER_PREFIX: &str = "??? - ";

/// Synthesized display name for a peer with no alias anywhere: a fixed
/// prefix plus the first 8 characters of the base64url public key.
pub fn default_display_name(key: &PublicKey) -> String {
    let b64 = key.to_base64();
    // 32-byte keys always encode to 44 characters, so the slice is safe.
    format!("{UNKNOWN_SENDER_PREFIX}{}...", &b64[..8])
}

/// Resolve a sender's display name through cache, directory, and fallback.
///
/// A directory failure during the read-through is reported and resolution
/// falls back to the synthesized name; one bad read must not take down the
/// pipeline.
pub fn resolve_display_name<S: AliasDirectory>(
    cache: &AliasCache<S>,
    sender: &Identity,
) -> String {
    match cache.lookup(sender) {
        Ok(Some(name)) => name,
        Ok(None) => default_display_name(&sender.public_key),
        Err(e) => {
            tracing::error!("alias lookup failed: {e}");
            default_display_name(&sender.public_key)
        },
    }
}

/// Handle to a running pipeline task.
///
/// Stopping is idempotent and first-wins: a peer switch and a global
/// shutdown may both request a stop, and whichever arrives first takes
/// effect while the other is a no-op. Dropping the handle also stops the
/// pipeline.
pub struct PipelineHandle {
    stop: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl PipelineHandle {
    /// Signal the pipeline to stop.
    ///
    /// Takes effect even mid-sleep: the polling loop selects on this
    /// signal alongside its timer. Safe to call any number of times.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    /// Whether a stop has been requested.
    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// Wait for the pipeline task to finish.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Spawn the resolution pipeline for a session.
///
/// The task runs until [`PipelineHandle::stop`] is called or the handle is
/// dropped. Must be called from within a tokio runtime.
pub fn spawn_pipeline<T, D, S>(
    transport: Arc<T>,
    display: Arc<D>,
    cache: AliasCache<S>,
) -> PipelineHandle
where
    T: Transport,
    D: DisplaySink,
    S: AliasDirectory,
{
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(POLL_INTERVAL);

        loop {
            tokio::select! {
                // Fires on stop() and on handle drop alike.
                _ = stop_rx.changed() => break,
                _ = heartbeat.tick() => {
                    drain_batch(&*transport, &*display, &cache);
                },
            }
        }
    });

    PipelineHandle { stop: stop_tx, task }
}

/// Drain and resolve one batch of inbound payloads.
///
/// A payload that fails to decode is dropped individually; corrupt entries
/// never abort the rest of the batch.
fn drain_batch<T, D, S>(transport: &T, display: &D, cache: &AliasCache<S>)
where
    T: Transport,
    D: DisplaySink,
    S: AliasDirectory,
{
    for payload in transport.drain_received() {
        let message = match ChatMessage::decode(&payload) {
            Ok(message) => message,
            Err(e) => {
                tracing::debug!("dropping undecodable inbound payload: {e}");
                continue;
            },
        };

        let display_name = resolve_display_name(cache, &message.sender());
        let content = String::from_utf8_lossy(&message.content);
        display.write_message(&content, &display_name);
    }
}
