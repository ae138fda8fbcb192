//! Chat room handle and shutdown sequence
//!
//! `ChatRoom` starts the acceptor and coordinator tasks and tears them down
//! in a fixed order when closed.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::acceptor::Acceptor;
use crate::client::ClientSession;
use crate::config::RoomConfig;
use crate::coordinator::Coordinator;
use crate::error::RoomError;
use crate::types::RoomState;

/// A running chat room
///
/// Listening and dispatching start as soon as the room is created.
/// Call `close` to tear it down; dropping the room without closing it
/// still stops both tasks, but does not wait for them.
pub struct ChatRoom {
    local_addr: SocketAddr,
    state: Arc<AtomicU8>,
    /// Flips to `true` once teardown has finished
    stopped: watch::Receiver<bool>,
    sessions: watch::Receiver<usize>,
    tasks: Mutex<Option<RoomTasks>>,
}

/// Stop signals and handles of the room's long-running tasks
struct RoomTasks {
    stop_acceptor: oneshot::Sender<()>,
    acceptor: JoinHandle<()>,
    stop_coordinator: oneshot::Sender<()>,
    coordinator: JoinHandle<Vec<ClientSession>>,
    state: Arc<AtomicU8>,
    stopped: watch::Sender<bool>,
}

impl ChatRoom {
    /// Start a room on the default address
    pub async fn start() -> Result<Self, RoomError> {
        Self::with_config(RoomConfig::default()).await
    }

    /// Start a room on `addr` with default capacities
    pub async fn bind(addr: &str) -> Result<Self, RoomError> {
        Self::with_config(RoomConfig::with_addr(addr)).await
    }

    /// Start a room from a full configuration
    pub async fn with_config(config: RoomConfig) -> Result<Self, RoomError> {
        let listener = TcpListener::bind(&config.addr).await?;
        let local_addr = listener.local_addr()?;

        let (join_tx, join_rx) = mpsc::channel(config.join_capacity);
        let (stop_acceptor, acceptor_rx) = oneshot::channel();
        let (stop_coordinator, coordinator_rx) = oneshot::channel();

        let coordinator = Coordinator::new(join_rx, coordinator_rx, config.event_capacity);
        let sessions = coordinator.session_count();
        let coordinator = tokio::spawn(coordinator.run());
        let acceptor = tokio::spawn(Acceptor::new(listener, join_tx, acceptor_rx).run());

        let state = Arc::new(AtomicU8::new(RoomState::Running as u8));
        let (stopped_tx, stopped) = watch::channel(false);

        info!("Chat room started: {}", local_addr);

        Ok(Self {
            local_addr,
            state: Arc::clone(&state),
            stopped,
            sessions,
            tasks: Mutex::new(Some(RoomTasks {
                stop_acceptor,
                acceptor,
                stop_coordinator,
                coordinator,
                state,
                stopped: stopped_tx,
            })),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Current lifecycle state
    pub fn state(&self) -> RoomState {
        RoomState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Watch the number of sessions in the registry
    ///
    /// Updated by the coordinator after every join and departure.
    pub fn session_count(&self) -> watch::Receiver<usize> {
        self.sessions.clone()
    }

    /// Shut the room down and wait until teardown completes
    ///
    /// Order: close the listener, stop the coordinator, then close every
    /// registered session and join its read task. Safe to call more than
    /// once and from several tasks; later callers wait for the first one.
    ///
    /// Teardown runs in its own task, so it completes even if the caller
    /// stops awaiting. Only the first caller sees a teardown error.
    pub async fn close(&self) -> Result<(), RoomError> {
        if self
            .state
            .compare_exchange(
                RoomState::Running as u8,
                RoomState::Draining as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            debug!("Close already requested, waiting for teardown");
            return self.wait_stopped().await;
        }

        let tasks = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match tasks {
            Some(tasks) => tokio::spawn(tasks.shutdown()).await?,
            None => self.wait_stopped().await,
        }
    }

    async fn wait_stopped(&self) -> Result<(), RoomError> {
        let mut stopped = self.stopped.clone();
        if stopped.wait_for(|done| *done).await.is_err() {
            // Teardown task died before finishing
            debug!("Teardown ended without completing");
        }
        Ok(())
    }
}

impl RoomTasks {
    async fn shutdown(self) -> Result<(), RoomError> {
        let RoomTasks {
            stop_acceptor,
            acceptor,
            stop_coordinator,
            coordinator,
            state,
            stopped,
        } = self;

        let result = stop_tasks(stop_acceptor, acceptor, stop_coordinator, coordinator).await;

        state.store(RoomState::Stopped as u8, Ordering::Release);
        stopped.send_replace(true);
        info!("Chat room closed");

        result
    }
}

/// Steps of the shutdown sequence, strictly in order
async fn stop_tasks(
    stop_acceptor: oneshot::Sender<()>,
    acceptor: JoinHandle<()>,
    stop_coordinator: oneshot::Sender<()>,
    coordinator: JoinHandle<Vec<ClientSession>>,
) -> Result<(), RoomError> {
    // Don't accept any more connections
    let _ = stop_acceptor.send(());
    let acceptor_result = acceptor.await;
    debug!("Listener closed");

    // No joins or broadcasts are processed after this
    let _ = stop_coordinator.send(());
    let sessions = coordinator.await?;

    info!("Dropping {} sessions", sessions.len());
    for session in sessions {
        session.close().await;
    }

    acceptor_result?;
    Ok(())
}
