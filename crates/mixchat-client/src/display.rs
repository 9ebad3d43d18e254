//! Display collaborator contract.
//!
//! Terminal rendering and layout live outside the core; all it needs is a
//! way to hand lines to whatever is drawing the screen. Implementations
//! are fire-and-forget and must be callable from any task.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Write-a-line capability the core hands resolved output to.
pub trait DisplaySink: Send + Sync + 'static {
    /// Show a chat message attributed to a resolved display name.
    fn write_message(&self, text: &str, display_name: &str);

    /// Show an out-of-band notice (errors, reminders).
    fn write_notice(&self, text: &str, category: &str);

    /// Show informational output (command results, usage).
    fn write_info(&self, text: &str, category: &str);
}

/// Display that prints to stdout, for the line-oriented binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutDisplay;

#[allow(clippy::print_stdout, reason = "this sink is stdout by definition")]
impl DisplaySink for StdoutDisplay {
    fn write_message(&self, text: &str, display_name: &str) {
        println!("{display_name}: {text}");
    }

    fn write_notice(&self, text: &str, category: &str) {
        println!("[{category}] {text}");
    }

    fn write_info(&self, text: &str, category: &str) {
        println!("[{category}] {text}");
    }
}

/// A line written to a [`RecordingDisplay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayLine {
    /// A chat message with its resolved display name.
    Message {
        /// Message text.
        text: String,
        /// Resolved sender display name.
        display_name: String,
    },
    /// A notice with its category.
    Notice {
        /// Notice text.
        text: String,
        /// Notice category.
        category: String,
    },
    /// Informational output with its category.
    Info {
        /// Info text.
        text: String,
        /// Info category.
        category: String,
    },
}

/// Display that records everything written to it, for tests and
/// simulation.
#[derive(Debug, Clone, Default)]
pub struct RecordingDisplay {
    lines: Arc<Mutex<Vec<DisplayLine>>>,
}

impl RecordingDisplay {
    /// Create an empty recording display.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the recorded lines, recovering from poisoning.
    fn lock(&self) -> MutexGuard<'_, Vec<DisplayLine>> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Everything written so far, in order.
    pub fn lines(&self) -> Vec<DisplayLine> {
        self.lock().clone()
    }

    /// Only the chat messages written so far, as (text, name) pairs.
    pub fn messages(&self) -> Vec<(String, String)> {
        self.lock()
            .iter()
            .filter_map(|line| match line {
                DisplayLine::Message { text, display_name } => {
                    Some((text.clone(), display_name.clone()))
                },
                DisplayLine::Notice { .. } | DisplayLine::Info { .. } => None,
            })
            .collect()
    }
}

impl DisplaySink for RecordingDisplay {
    fn write_message(&self, text: &str, display_name: &str) {
        self.lock().push(DisplayLine::Message {
            text: text.to_string(),
            display_name: display_name.to_string(),
        });
    }

    fn write_notice(&self, text: &str, category: &str) {
        self.lock().push(DisplayLine::Notice {
            text: text.to_string(),
            category: category.to_string(),
        });
    }

    fn write_info(&self, text: &str, category: &str) {
        self.lock().push(DisplayLine::Info {
            text: text.to_string(),
            category: category.to_string(),
        });
    }
}
