//! TCP Broadcast Chat Room Library
//!
//! A small chat room over plain TCP. Every line a client sends is
//! forwarded to every other connected client, prefixed with the sender's
//! display name.
//!
//! # Features
//! - Newline-delimited text protocol
//! - Sequential display names (`Conn: 0`, `Conn: 1`, ...)
//! - Disconnected clients are pruned while the room runs
//! - Ordered, idempotent graceful shutdown
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `Coordinator` is the only task that touches the session registry
//! - `Acceptor` turns accepted connections into join events
//! - Each `ClientSession` runs a read task that reports lines to the coordinator
//! - `ChatRoom::close` stops the acceptor, then the coordinator, then every session
//!
//! # Example
//! ```no_run
//! use chat_room::ChatRoom;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chat_room::RoomError> {
//!     let room = ChatRoom::bind("127.0.0.1:6000").await?;
//!     tokio::signal::ctrl_c().await?;
//!     room.close().await
//! }
//! ```

pub mod acceptor;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod message;
pub mod room;
pub mod types;

// Re-export main types for convenience
pub use acceptor::Acceptor;
pub use client::ClientSession;
pub use config::{RoomConfig, DEFAULT_ADDR};
pub use coordinator::Coordinator;
pub use error::{RoomError, SessionError};
pub use message::{Message, SessionEvent};
pub use room::ChatRoom;
pub use types::{RoomState, SessionId};
