//! Basic type definitions for the chat room
//!
//! Provides:
//! - `SessionId`: UUID-based identity of one connected session
//! - `RoomState`: lifecycle of the room and its coordinator

use uuid::Uuid;

/// Unique session identifier (newtype pattern)
///
/// Only used to tell sessions apart, e.g. to skip the sender of a
/// broadcast. It carries no meaning beyond equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Room lifecycle
///
/// Transitions only move forward: `Running -> Draining -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RoomState {
    /// Accepting connections and broadcasting
    Running = 0,
    /// Shutdown requested, teardown in progress
    Draining = 1,
    /// Fully torn down
    Stopped = 2,
}

impl RoomState {
    /// Decode a state previously stored with `as u8`
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => RoomState::Running,
            1 => RoomState::Draining,
            _ => RoomState::Stopped,
        }
    }
}

impl std::fmt::Display for RoomState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RoomState::Running => "running",
            RoomState::Draining => "draining",
            RoomState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
