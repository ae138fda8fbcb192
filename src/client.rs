//! Client session
//!
//! One accepted connection plus its read task. The read task turns incoming
//! lines into `SessionEvent`s for the coordinator; the coordinator writes
//! broadcast output back through `ClientSession::write`.

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::MAX_LINE_LEN;
use crate::error::SessionError;
use crate::message::{format_line, Message, SessionEvent};
use crate::types::SessionId;

/// Connected participant
///
/// Owned by the coordinator's registry. The read half of the connection
/// lives in the read task; the write half stays here.
#[derive(Debug)]
pub struct ClientSession {
    /// Identity used to skip the sender during broadcast
    pub id: SessionId,
    /// Display name assigned at join time
    pub name: String,
    writer: BufWriter<OwnedWriteHalf>,
    cancel: oneshot::Sender<()>,
    read_task: JoinHandle<()>,
}

impl ClientSession {
    /// Wrap an accepted connection and start its read task
    ///
    /// Returns immediately; lines read from `stream` are forwarded to `events`.
    pub fn spawn(stream: TcpStream, name: String, events: mpsc::Sender<SessionEvent>) -> Self {
        let id = SessionId::new();
        let (reader, writer) = stream.into_split();
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let read_task = tokio::spawn(read_loop(
            id,
            name.clone(),
            BufReader::new(reader),
            events,
            cancel_rx,
        ));

        Self {
            id,
            name,
            writer: BufWriter::new(writer),
            cancel: cancel_tx,
            read_task,
        }
    }

    /// Deliver a line sent by the participant named `from`
    ///
    /// Writes `"<from> <text>"` and flushes. An error means the peer is gone.
    pub async fn write(&mut self, from: &str, msg: &Message) -> Result<(), SessionError> {
        let line = format_line(from, msg);
        debug!("To {}: {}", self.name, line.trim_end());

        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Close the connection and wait for the read task to finish
    pub async fn close(self) {
        let Self {
            id,
            name,
            mut writer,
            cancel,
            read_task,
        } = self;

        // Peer observes end-of-stream once the write half is shut down
        if let Err(e) = writer.shutdown().await {
            debug!("Shutdown of {} failed: {}", name, e);
        }
        drop(writer);

        // The read task may already be gone, so a failed send is fine
        let _ = cancel.send(());

        if let Err(e) = read_task.await {
            warn!("Read task for {} ended abnormally: {}", name, e);
        }

        debug!("Session {} ({}) closed", name, id);
    }
}

/// Read lines until end-of-stream, a read error, an overlong line, or cancellation
///
/// Everything but cancellation counts as leaving on its own and produces
/// `SessionEvent::Left`.
async fn read_loop(
    id: SessionId,
    name: String,
    mut reader: BufReader<OwnedReadHalf>,
    events: mpsc::Sender<SessionEvent>,
    mut cancel: oneshot::Receiver<()>,
) {
    let mut buf = Vec::new();

    loop {
        buf.clear();

        let mut limited = (&mut reader).take(MAX_LINE_LEN as u64);
        let read = tokio::select! {
            _ = &mut cancel => {
                debug!("Read task for {} cancelled", name);
                return;
            }
            read = limited.read_until(b'\n', &mut buf) => read,
        };

        match read {
            Ok(0) => {
                info!("EOF: {} leaving chat", name);
                break;
            }
            Ok(n) if n >= MAX_LINE_LEN && buf.last() != Some(&b'\n') => {
                warn!("{} sent a line over {} bytes, dropping connection", name, MAX_LINE_LEN);
                break;
            }
            Ok(n) if buf.last() != Some(&b'\n') => {
                debug!("{} closed mid-line, dropping {} bytes", name, n);
                info!("EOF: {} leaving chat", name);
                break;
            }
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf).into_owned();
                let event = SessionEvent::Message {
                    from: name.clone(),
                    msg: Message::new(text, id),
                };

                tokio::select! {
                    _ = &mut cancel => {
                        debug!("Read task for {} cancelled", name);
                        return;
                    }
                    sent = events.send(event) => {
                        if sent.is_err() {
                            debug!("Coordinator closed, ending read task for {}", name);
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                warn!("Read error for {}: {}", name, e);
                break;
            }
        }
    }

    tokio::select! {
        _ = &mut cancel => {}
        _ = events.send(SessionEvent::Left(id)) => {}
    }
}
