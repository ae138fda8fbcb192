//! Error types for the chat room
//!
//! Defines room-level errors and per-session write errors.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Room-level errors
///
/// Returned by the lifecycle operations of `ChatRoom`.
#[derive(Debug, Error)]
pub enum RoomError {
    /// IO error while binding or inspecting the listener
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A room task panicked or was aborted
    #[error("Room task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Session write errors
///
/// A failed write means the peer is gone; the coordinator prunes the session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The connection rejected the write or flush
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
