//! Client core for mixchat: alias resolution over a mixnet transport.
//!
//! The pieces here share one persisted [`mixchat_store::AliasDirectory`]
//! and one in-memory [`AliasCache`] between two concurrent activities: the
//! background [message resolution pipeline](spawn_pipeline) that drains
//! inbound payloads and resolves sender names, and the foreground
//! [command handler](commands) that mutates alias assignments. A
//! [`Session`] tracks the single active conversation.
//!
//! The mixnet transport and the terminal are external collaborators,
//! reached only through the narrow [`Transport`] and [`DisplaySink`]
//! traits.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod cache;
mod client;
pub mod commands;
mod display;
mod pipeline;
mod session;
mod transport;

pub use cache::{AliasCache, decode_cache_key, encode_cache_key};
pub use client::ChatClient;
pub use commands::{AliasCommand, Command, CommandError};
pub use display::{DisplayLine, DisplaySink, RecordingDisplay, StdoutDisplay};
pub use pipeline::{
    POLL_INTERVAL, PipelineHandle, default_display_name, resolve_display_name, spawn_pipeline,
};
pub use session::Session;
pub use transport::{LoopbackTransport, Transport, TransportError};
