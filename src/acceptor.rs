//! Connection acceptor
//!
//! Accepts TCP connections and hands each one to the coordinator as a join.
//! Stopping is an explicit signal; accept errors never stop the loop.

use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Pause after a failed accept so persistent errors do not spin
pub const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Accept loop owning the listening socket
pub struct Acceptor {
    listener: TcpListener,
    joins: mpsc::Sender<TcpStream>,
    stop: oneshot::Receiver<()>,
}

impl Acceptor {
    /// Create an acceptor feeding `joins` until `stop` fires or is dropped
    pub fn new(
        listener: TcpListener,
        joins: mpsc::Sender<TcpStream>,
        stop: oneshot::Receiver<()>,
    ) -> Self {
        Self {
            listener,
            joins,
            stop,
        }
    }

    /// Run the accept loop
    ///
    /// The listener is dropped, and therefore closed, when this returns.
    pub async fn run(self) {
        let Acceptor {
            listener,
            joins,
            mut stop,
        } = self;

        if let Ok(addr) = listener.local_addr() {
            info!("Chat room accepting on {}", addr);
        }

        loop {
            let accepted = tokio::select! {
                biased;
                _ = &mut stop => break,
                accepted = listener.accept() => accepted,
            };

            match accepted {
                Ok((stream, peer)) => {
                    debug!("New connection from {}", peer);

                    // Blocks while the coordinator is busy
                    tokio::select! {
                        biased;
                        _ = &mut stop => break,
                        sent = joins.send(stream) => {
                            if sent.is_err() {
                                debug!("Coordinator gone, stopping acceptor");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    tokio::select! {
                        biased;
                        _ = &mut stop => break,
                        _ = tokio::time::sleep(ACCEPT_BACKOFF) => {}
                    }
                }
            }
        }

        drop(listener);
        info!("Acceptor stopped, listener closed");
    }
}
