use std::net::SocketAddr;
use std::time::Duration;

use chat_room::{ChatRoom, RoomState};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(150);

struct Peer {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Peer {
    async fn connect(addr: SocketAddr) -> Peer {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, writer) = stream.into_split();
        Peer {
            reader: BufReader::new(reader),
            writer,
        }
    }

    async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
    }

    async fn read_line(&mut self) -> String {
        let mut line = String::new();
        timeout(WAIT, self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for a line")
            .unwrap();
        line
    }

    async fn assert_silent(&mut self) {
        let mut line = String::new();
        let read = timeout(QUIET, self.reader.read_line(&mut line)).await;
        assert!(read.is_err(), "unexpected data: {:?}", line);
    }

    async fn assert_closed(&mut self) {
        let mut buf = [0u8; 64];
        let n = timeout(WAIT, self.reader.read(&mut buf))
            .await
            .expect("connection was not closed")
            .unwrap_or(0);
        assert_eq!(n, 0);
    }
}

async fn start_room() -> ChatRoom {
    ChatRoom::bind("127.0.0.1:0").await.unwrap()
}

async fn wait_for_sessions(room: &ChatRoom, n: usize) {
    let mut count = room.session_count();
    timeout(WAIT, count.wait_for(|c| *c == n))
        .await
        .expect("sessions never registered")
        .unwrap();
}

/// Connect `n` peers one after another, each registered before the next connects
async fn join_peers(room: &ChatRoom, n: usize) -> Vec<Peer> {
    let mut peers = Vec::new();
    for i in 0..n {
        peers.push(Peer::connect(room.local_addr()).await);
        wait_for_sessions(room, i + 1).await;
    }
    peers
}

#[tokio::test]
async fn hello_reaches_everyone_but_sender_then_close_ends_all() {
    let room = start_room().await;
    let mut peers = join_peers(&room, 3).await;

    peers[0].send("hello\n").await;

    assert_eq!(peers[1].read_line().await, "Conn: 0 hello\n");
    assert_eq!(peers[2].read_line().await, "Conn: 0 hello\n");
    peers[0].assert_silent().await;

    timeout(WAIT, room.close()).await.unwrap().unwrap();
    assert_eq!(room.state(), RoomState::Stopped);

    for peer in &mut peers {
        peer.assert_closed().await;
    }
}

#[tokio::test]
async fn display_names_follow_join_order() {
    let room = start_room().await;
    let mut peers = join_peers(&room, 3).await;

    peers[1].send("one\n").await;
    assert_eq!(peers[0].read_line().await, "Conn: 1 one\n");

    peers[2].send("two\n").await;
    assert_eq!(peers[0].read_line().await, "Conn: 2 two\n");

    peers[0].send("zero\n").await;
    assert_eq!(peers[1].read_line().await, "Conn: 0 zero\n");

    room.close().await.unwrap();
}

#[tokio::test]
async fn fan_out_delivers_exactly_one_copy() {
    let room = start_room().await;
    let mut peers = join_peers(&room, 5).await;

    peers[2].send("ping\n").await;

    for (i, peer) in peers.iter_mut().enumerate() {
        if i != 2 {
            assert_eq!(peer.read_line().await, "Conn: 2 ping\n");
        }
        peer.assert_silent().await;
    }

    room.close().await.unwrap();
}

#[tokio::test]
async fn lines_from_one_sender_keep_their_order() {
    let room = start_room().await;
    let mut peers = join_peers(&room, 2).await;

    let batch: String = (0..20).map(|i| format!("line {}\n", i)).collect();
    peers[0].send(&batch).await;

    for i in 0..20 {
        assert_eq!(peers[1].read_line().await, format!("Conn: 0 line {}\n", i));
    }

    room.close().await.unwrap();
}

#[tokio::test]
async fn disconnected_session_is_pruned() {
    let room = start_room().await;
    let mut peers = join_peers(&room, 3).await;

    let gone = peers.remove(1);
    drop(gone);
    wait_for_sessions(&room, 2).await;

    peers[0].send("still here\n").await;
    assert_eq!(peers[1].read_line().await, "Conn: 0 still here\n");

    // Names come from the current registry size
    let mut late = Peer::connect(room.local_addr()).await;
    wait_for_sessions(&room, 3).await;
    late.send("late\n").await;
    assert_eq!(peers[0].read_line().await, "Conn: 2 late\n");
    assert_eq!(peers[1].read_line().await, "Conn: 2 late\n");

    room.close().await.unwrap();
}

#[tokio::test]
async fn closed_room_refuses_new_connections() {
    let room = start_room().await;
    let addr = room.local_addr();
    let mut peers = join_peers(&room, 1).await;

    room.close().await.unwrap();

    peers[0].assert_closed().await;
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn close_twice_is_harmless() {
    let room = start_room().await;
    let _peers = join_peers(&room, 2).await;

    room.close().await.unwrap();
    room.close().await.unwrap();
    assert_eq!(room.state(), RoomState::Stopped);
}

#[tokio::test]
async fn close_with_idle_clients_does_not_hang() {
    let room = start_room().await;
    let mut peers = join_peers(&room, 4).await;

    // Nobody disconnects on their own; close must still finish
    timeout(WAIT, room.close()).await.unwrap().unwrap();

    for peer in &mut peers {
        peer.assert_closed().await;
    }
}
