//! Client orchestration.
//!
//! [`ChatClient`] wires the shared directory, cache, and session together
//! and owns the lifetime of the per-session resolution pipeline. It is the
//! only place that constructs those shared instances; everything else gets
//! an explicit handle, never an ambient global.

use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use bytes::Bytes;
use mixchat_proto::{ChatMessage, Identity, ProtocolError};
use mixchat_store::AliasDirectory;

use crate::{
    AliasCache, AliasCommand, Command, DisplaySink, PipelineHandle, Session, Transport,
    commands::format_record,
    pipeline::{resolve_display_name, spawn_pipeline},
};

/// Sender's clock as Unix nanoseconds, for stamping outbound messages.
fn unix_timestamp_nanos() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| d.as_nanos() as i64)
}

/// A chat client bound to one conversation peer at a time.
///
/// Two concurrent activities run against the same directory and cache: the
/// background resolution pipeline (spawned by [`ChatClient::start`]) and
/// the foreground command handler (driven by [`ChatClient::handle_input`]).
/// Switching peers tears the pipeline down with the session and starts a
/// fresh pair.
pub struct ChatClient<T, D, S>
where
    T: Transport,
    D: DisplaySink,
    S: AliasDirectory,
{
    transport: Arc<T>,
    display: Arc<D>,
    directory: S,
    cache: AliasCache<S>,
    session: Session,
    commands: Vec<Box<dyn Command>>,
    pipeline: Option<PipelineHandle>,
}

impl<T, D, S> ChatClient<T, D, S>
where
    T: Transport,
    D: DisplaySink,
    S: AliasDirectory,
{
    /// Create a client talking to `recipient`.
    ///
    /// The initial session alias is whatever the peer resolves to right
    /// now: a stored alias if one exists, a synthesized fallback name
    /// otherwise.
    pub fn new(transport: T, display: D, directory: S, recipient: Identity) -> Self {
        let transport = Arc::new(transport);
        let display = Arc::new(display);
        let cache = AliasCache::new(directory.clone());

        let initial_alias = resolve_display_name(&cache, &recipient);
        let session = Session::new(recipient, initial_alias);
        let commands = Self::build_commands(&directory, &cache, &session, &display);

        Self { transport, display, directory, cache, session, commands, pipeline: None }
    }

    /// The command set bound to a session. Rebuilt on every peer switch so
    /// handlers never target a stale session.
    fn build_commands(
        directory: &S,
        cache: &AliasCache<S>,
        session: &Session,
        display: &Arc<D>,
    ) -> Vec<Box<dyn Command>> {
        vec![Box::new(AliasCommand::new(
            directory.clone(),
            cache.clone(),
            session.clone(),
            Arc::clone(display),
        ))]
    }

    /// Start the resolution pipeline for the current session.
    ///
    /// No-op if it is already running. Must be called from within a tokio
    /// runtime.
    pub fn start(&mut self) {
        if self.pipeline.is_none() {
            self.pipeline = Some(spawn_pipeline(
                Arc::clone(&self.transport),
                Arc::clone(&self.display),
                self.cache.clone(),
            ));
        }
    }

    /// Route one line of user input: `/`-prefixed lines are commands,
    /// everything else is sent to the current peer.
    pub fn handle_input(&self, input: &str) {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return;
        }

        match trimmed.strip_prefix('/') {
            Some(command) => self.run_command(command),
            None => self.send_message(trimmed),
        }
    }

    /// Parse and dispatch a command line (already stripped of `/`).
    fn run_command(&self, command: &str) {
        let args: Vec<&str> = command.split_whitespace().collect();
        let Some(&name) = args.first() else {
            self.display.write_notice("no valid command provided", "error");
            return;
        };

        match self.commands.iter().find(|c| c.name() == name) {
            Some(cmd) => {
                if let Err(e) = cmd.handle(&args) {
                    self.display.write_notice(&format!("{name}: {e}"), "error");
                }

                // Every completed command re-checks cached entries against
                // the directory; between commands the cache may serve
                // stale names.
                if let Err(e) = self.cache.reconcile() {
                    tracing::error!("cache reconcile failed: {e}");
                }
            },
            None => {
                self.display.write_notice(&format!("Command: {name} does not exist"), "error");
                self.show_available_commands();
            },
        }
    }

    /// Send a chat message to the current peer and echo it locally.
    pub fn send_message(&self, text: &str) {
        let payload = match self.build_payload(text) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("failed to encode outbound message: {e}");
                self.display.write_notice("Could not send message", "ERROR");
                return;
            },
        };

        if let Err(e) = self.transport.send(payload, &self.session.recipient()) {
            tracing::warn!("transport rejected outbound message: {e}");
            self.display.write_notice("Could not send message", "ERROR");
            return;
        }

        self.display.write_message(text, "You");
    }

    /// Build the wire payload for an outbound message.
    ///
    /// Consumes one session nonce. A transport rejection afterwards still
    /// burns it; the sequence must keep increasing, not be dense on the
    /// wire.
    fn build_payload(&self, text: &str) -> Result<Bytes, ProtocolError> {
        let message = ChatMessage {
            content: text.as_bytes().to_vec(),
            sender_public_key: self.transport.own_public_key(),
            sender_provider_key: self.transport.provider_public_key(),
            nonce: self.session.next_nonce(),
            timestamp: unix_timestamp_nanos(),
            signature: None, // signing is unimplemented upstream
        };

        Ok(Bytes::from(message.encode()?))
    }

    /// Switch the conversation to a different peer.
    ///
    /// Stops the old session's pipeline, replaces the session (fresh
    /// nonce, freshly resolved alias), rebinds the command set, and starts
    /// a new pipeline.
    pub fn switch_recipient(&mut self, recipient: Identity) {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.stop();
        }

        let initial_alias = resolve_display_name(&self.cache, &recipient);
        self.session = Session::new(recipient, initial_alias);
        self.commands =
            Self::build_commands(&self.directory, &self.cache, &self.session, &self.display);

        self.start();
    }

    /// Stop the client.
    ///
    /// Idempotent: repeated calls (or a call racing a peer switch) are
    /// no-ops after the first.
    pub fn shutdown(&mut self) {
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.stop();
        }
    }

    /// Print the usage of every registered command.
    pub fn show_available_commands(&self) {
        let mut usage = String::from("\n");
        for command in &self.commands {
            usage.push_str(&command.usage());
            usage.push('\n');
        }
        self.display.write_info(&usage, "Available commands");
    }

    /// Print the startup notices: our own shareable key and the current
    /// recipient.
    pub fn announce(&self) {
        let own_key = self.transport.own_public_key().to_base64();
        self.display.write_notice(
            &format!(
                "Your public key is: {own_key} Share it off channel with anyone you wish to communicate with."
            ),
            "Reminder",
        );

        let recipient = match self.directory.get(&self.session.recipient()) {
            Ok(record) => format_record(&record),
            Err(e) => {
                tracing::error!("failed to read recipient record: {e}");
                self.session.recipient().public_key.to_base64()
            },
        };
        self.display
            .write_notice(&format!("You're currently sending messages to: {recipient}"), "Reminder");
    }

    /// The active session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The shared alias cache.
    pub fn cache(&self) -> &AliasCache<S> {
        &self.cache
    }
}
