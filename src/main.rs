//! TCP Broadcast Chat Room - Entry Point
//!
//! Starts the room, runs until Ctrl-C, then shuts it down gracefully.

use std::env;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chat_room::{ChatRoom, RoomConfig, DEFAULT_ADDR};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=chat_room=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_room=info")),
        )
        .init();

    // Get bind address from command line or use default
    let addr = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let room = ChatRoom::with_config(RoomConfig::with_addr(addr)).await?;
    info!("Chat room listening on {}", room.local_addr());

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
    }

    info!("Shutting down");
    room.close().await?;

    Ok(())
}
