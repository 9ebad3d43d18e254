//! Error types for the alias directory.

use thiserror::Error;

/// Errors from directory operations.
///
/// Storage failures are returned to the caller rather than aborting the
/// process; the caller decides whether to retry, report, or give up.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// Underlying storage I/O failure (open, read, write, commit).
    #[error("directory I/O error: {0}")]
    Io(String),

    /// A stored record could not be interpreted.
    #[error("corrupt directory record: {0}")]
    Corrupt(String),

    /// A directory key had the wrong shape.
    #[error("invalid directory key: expected {expected} bytes, got {got}")]
    InvalidKey {
        /// Required encoded key length.
        expected: usize,
        /// Length that was actually present.
        got: usize,
    },
}
