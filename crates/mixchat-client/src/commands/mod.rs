//! Administrative commands typed by the user.
//!
//! A command is a `/`-prefixed input line; the client strips the slash,
//! splits on whitespace, and dispatches on the leading token. Handlers
//! validate fully before mutating anything: an invalid argument reports a
//! failure and leaves directory, cache, and session untouched.

mod alias;

pub use alias::{AliasCommand, format_record};
use mixchat_store::DirectoryError;
use thiserror::Error;

/// Errors from parsing or executing a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command needs more arguments than were supplied.
    #[error("not enough arguments")]
    NotEnoughArguments,

    /// An argument was unusable: a reserved alias name, undecodable
    /// base64 key material, or a shape the command doesn't take.
    #[error("invalid arguments")]
    InvalidArguments,

    /// The subcommand token is not one the command knows.
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    /// A handler was dispatched for a command it doesn't implement.
    #[error("handler mismatch: expected {expected}, got {got}")]
    HandlerMismatch {
        /// Command this handler implements.
        expected: &'static str,
        /// Command token that was actually dispatched.
        got: String,
    },

    /// The directory failed underneath the command.
    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// A named command with usage text and a handler.
///
/// `args` always includes the command's own name at index 0; overloads are
/// resolved by argument count.
pub trait Command: Send + Sync {
    /// The leading token that selects this command.
    fn name(&self) -> &'static str;

    /// Human-readable usage, one overload per line.
    fn usage(&self) -> String;

    /// Execute the command.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] on malformed input or a directory failure.
    /// No state is mutated on a validation error.
    fn handle(&self, args: &[&str]) -> Result<(), CommandError>;
}
