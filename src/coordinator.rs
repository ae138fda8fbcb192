//! Room coordinator
//!
//! The single task that owns the session registry. Joins, session events
//! and the shutdown signal are all handled here one at a time, so the
//! registry is never shared and never locked.

use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::client::ClientSession;
use crate::message::{display_name, Message, SessionEvent};
use crate::types::{RoomState, SessionId};

/// The coordinator actor
///
/// Owns the registry until `run` returns it to the shutdown sequence.
pub struct Coordinator {
    /// Active sessions in join order
    registry: Vec<ClientSession>,
    /// Accepted connections waiting to join
    joins: mpsc::Receiver<TcpStream>,
    /// Lines and departures reported by session read tasks
    events: mpsc::Receiver<SessionEvent>,
    /// Handed to every new session
    events_tx: mpsc::Sender<SessionEvent>,
    /// Fires (or is dropped) when the room must stop
    shutdown: oneshot::Receiver<()>,
    /// Mirror of the registry size for observers
    sessions: watch::Sender<usize>,
    state: RoomState,
}

impl Coordinator {
    /// Create a coordinator reading joins from `joins`
    pub fn new(
        joins: mpsc::Receiver<TcpStream>,
        shutdown: oneshot::Receiver<()>,
        event_capacity: usize,
    ) -> Self {
        let (events_tx, events) = mpsc::channel(event_capacity);
        let (sessions, _) = watch::channel(0);
        Self {
            registry: Vec::new(),
            joins,
            events,
            events_tx,
            shutdown,
            sessions,
            state: RoomState::Running,
        }
    }

    /// Watch the number of registered sessions
    pub fn session_count(&self) -> watch::Receiver<usize> {
        self.sessions.subscribe()
    }

    /// Sender feeding this coordinator's event queue
    pub fn event_sender(&self) -> mpsc::Sender<SessionEvent> {
        self.events_tx.clone()
    }

    /// Run the event loop until shutdown
    ///
    /// Returns the registry as it stood when the loop stopped; the caller
    /// is responsible for closing those sessions.
    pub async fn run(mut self) -> Vec<ClientSession> {
        info!("Coordinator started");
        let mut joins_open = true;

        loop {
            tokio::select! {
                biased;
                _ = &mut self.shutdown => break,
                Some(event) = self.events.recv() => {
                    self.handle_event(event).await;
                }
                join = self.joins.recv(), if joins_open => match join {
                    Some(stream) => self.handle_join(stream),
                    None => {
                        debug!("Join queue closed");
                        joins_open = false;
                    }
                },
            }
        }

        self.drain().await;

        self.state = RoomState::Stopped;
        info!(
            "Coordinator {}, {} sessions to drop",
            self.state,
            self.registry.len()
        );
        self.registry
    }

    /// Process a single session event
    async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Message { from, msg } => {
                for id in self.broadcast(&from, &msg).await {
                    self.remove(id).await;
                }
            }
            SessionEvent::Left(id) => {
                self.remove(id).await;
            }
        }
    }

    /// Admit a new connection
    fn handle_join(&mut self, stream: TcpStream) {
        let name = display_name(self.registry.len());
        match stream.peer_addr() {
            Ok(peer) => info!("New client joining chat: {} ({})", name, peer),
            Err(_) => info!("New client joining chat: {}", name),
        }

        let session = ClientSession::spawn(stream, name, self.events_tx.clone());
        self.registry.push(session);
        self.sessions.send_replace(self.registry.len());
        debug!("Total sessions: {}", self.registry.len());
    }

    /// Write `msg` to every session except its origin, in registry order
    ///
    /// Returns the sessions whose write failed.
    async fn broadcast(&mut self, from: &str, msg: &Message) -> Vec<SessionId> {
        let mut failed = Vec::new();
        for session in self.registry.iter_mut().filter(|s| s.id != msg.origin) {
            if let Err(e) = session.write(from, msg).await {
                warn!("Write to {} failed: {}", session.name, e);
                failed.push(session.id);
            }
        }
        failed
    }

    /// Remove a session from the registry and close it
    async fn remove(&mut self, id: SessionId) {
        let Some(index) = self.registry.iter().position(|s| s.id == id) else {
            return;
        };

        let session = self.registry.remove(index);
        self.sessions.send_replace(self.registry.len());
        info!("{} left the room", session.name);
        session.close().await;
        debug!("Total sessions: {}", self.registry.len());
    }

    /// Broadcast whatever was queued before shutdown, without touching the registry
    async fn drain(&mut self) {
        self.state = RoomState::Draining;
        info!("Coordinator {}", self.state);

        // Connections never admitted are closed as they are dropped
        self.joins.close();
        while let Some(stream) = self.joins.recv().await {
            debug!("Dropping pending join from {:?}", stream.peer_addr().ok());
        }

        // Read tasks stop once their next send fails
        self.events.close();
        while let Some(event) = self.events.recv().await {
            match event {
                SessionEvent::Message { from, msg } => {
                    let failed = self.broadcast(&from, &msg).await;
                    if !failed.is_empty() {
                        debug!("{} writes failed while draining", failed.len());
                    }
                }
                SessionEvent::Left(id) => {
                    debug!("Ignoring departure of {} while draining", id);
                }
            }
        }
    }
}
