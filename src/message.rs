//! Message protocol definitions
//!
//! Newline-delimited text in both directions. A client sends raw lines;
//! the room forwards each line to every other client prefixed with the
//! sender's display name.

use crate::types::SessionId;

/// One line read from a session
///
/// `text` keeps the trailing `\n` as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// The line, terminator included
    pub text: String,
    /// Sender identity, excluded from the broadcast
    pub origin: SessionId,
}

impl Message {
    /// Create a message from a line and its sender
    pub fn new(text: impl Into<String>, origin: SessionId) -> Self {
        Self {
            text: text.into(),
            origin,
        }
    }
}

/// Session → Coordinator event
#[derive(Debug)]
pub enum SessionEvent {
    /// A complete line arrived and must be broadcast
    ///
    /// `from` is the sender's display name, carried along so the line can
    /// still be delivered after the sender has been pruned.
    Message { from: String, msg: Message },
    /// The read task ended on its own (end-of-stream, read error or overlong line)
    Left(SessionId),
}

/// Display name given to the session joining a registry of `registry_len` sessions
pub fn display_name(registry_len: usize) -> String {
    format!("Conn: {}", registry_len)
}

/// Format a message for delivery: `"<display name> <line>"`
pub fn format_line(display_name: &str, msg: &Message) -> String {
    format!("{} {}", display_name, msg.text)
}
