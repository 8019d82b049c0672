use log::{error, info, warn};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use crate::client::{Client, ClientId, Payload};
use crate::config::RelayConfig;
use crate::relay::{BroadcastReport, Broadcaster};

/// Lifecycle of one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Active,
    Closed,
    Errored,
}

/// What happened to an inbound chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataOutcome {
    Relayed(BroadcastReport),
    /// Chunk exceeded the length limit; the connection must be terminated.
    Oversized,
    /// Connection already reached a terminal state.
    Ignored,
}

/// Per-connection state machine.
///
/// Registers itself on construction and deregisters on the first terminal
/// event (close or error). Later terminal events are no-ops.
pub struct ConnectionHandler {
    id: ClientId,
    serial: u64,
    broadcaster: Broadcaster,
    max_message_length: usize,
    state: ConnectionState,
}

impl ConnectionHandler {
    /// Connecting -> Active: puts `client` in the registry.
    pub async fn register(client: Client, broadcaster: Broadcaster, max_message_length: usize) -> Self {
        let id = client.id();
        let serial = client.serial();

        if let Some(stale) = broadcaster.registry().add(id, client).await {
            warn!("Client {} replaced stale connection #{}", id, stale.serial());
        }
        info!("New connection {}", id);

        Self {
            id,
            serial,
            broadcaster,
            max_message_length,
            state: ConnectionState::Active,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ConnectionState::Active
    }

    /// Validates one inbound chunk and relays it to every other client.
    pub async fn on_data(&mut self, chunk: &[u8]) -> DataOutcome {
        if !self.is_active() {
            return DataOutcome::Ignored;
        }

        if chunk.len() > self.max_message_length {
            info!("Invalid message from {}", self.id);
            return DataOutcome::Oversized;
        }

        let text = String::from_utf8_lossy(chunk);
        info!("Message from {}: {}", self.id, text.trim_end_matches(['\r', '\n']));

        let report = self.broadcaster.broadcast(&self.id, Payload::from(chunk)).await;
        DataOutcome::Relayed(report)
    }

    /// Active -> Closed. Returns false if the connection had already ended.
    pub async fn on_close(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = ConnectionState::Closed;
        self.deregister().await;
        info!("Client {} disconnected", self.id);
        true
    }

    /// Active -> Errored. Returns false if the connection had already ended.
    pub async fn on_error(&mut self, err: &io::Error) -> bool {
        if !self.is_active() {
            return false;
        }
        self.state = ConnectionState::Errored;
        error!("Unexpected client {} error: {}", self.id, err);
        self.deregister().await;
        true
    }

    async fn deregister(&self) {
        let registry = self.broadcaster.registry();
        if !registry.remove_if_current(&self.id, self.serial).await {
            // Either already removed or a newer connection owns the id now
            warn!("Client {} (#{}) was not in the registry", self.id, self.serial);
        }
    }
}

/// Drives an accepted connection until it closes, errors, or sends an
/// oversized chunk. The socket is dropped on every exit path.
pub async fn handle_client(
    stream: TcpStream,
    serial: u64,
    broadcaster: Broadcaster,
    config: Arc<RelayConfig>,
) {
    let peer_addr = match stream.peer_addr() {
        Ok(addr) => addr,
        Err(e) => {
            warn!("Dropping connection #{} without peer address: {}", serial, e);
            return;
        }
    };

    let (read_half, write_half) = stream.into_split();
    serve_connection(ClientId::from(peer_addr), serial, read_half, write_half, broadcaster, &config).await;
}

/// Runs one registered connection over any reader/writer pair.
///
/// Both halves are owned here and dropped before returning, whichever
/// terminal event ended the connection.
pub async fn serve_connection<R, W>(
    id: ClientId,
    serial: u64,
    mut reader: R,
    writer: W,
    broadcaster: Broadcaster,
    config: &RelayConfig,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (outbound_tx, outbound_rx) = mpsc::channel(config.outbound_queue_capacity);
    let mut writer = tokio::spawn(write_loop(id, writer, outbound_rx));

    let client = Client::new(id, serial, outbound_tx);
    let mut handler = ConnectionHandler::register(client, broadcaster, config.max_message_length).await;

    let mut buf = vec![0u8; config.read_buffer_size()];
    let mut writer_done = false;

    loop {
        tokio::select! {
            read = reader.read(&mut buf) => match read {
                Ok(0) => {
                    handler.on_close().await;
                    break;
                }
                Ok(n) => {
                    if handler.on_data(&buf[..n]).await == DataOutcome::Oversized {
                        handler.on_close().await;
                        break;
                    }
                }
                Err(e) => {
                    handler.on_error(&e).await;
                    break;
                }
            },
            written = &mut writer => {
                writer_done = true;
                match written {
                    Ok(Ok(())) => handler.on_close().await,
                    Ok(Err(e)) => handler.on_error(&e).await,
                    Err(e) => handler.on_error(&io::Error::other(e)).await,
                };
                break;
            }
        }
    }

    if !writer_done {
        // Aborting drops the write half; with the reader gone the socket closes
        writer.abort();
        let _ = writer.await;
    }
}

/// Writes queued payloads to the peer in order. Ends when every sender is
/// gone or a write fails.
async fn write_loop<W>(id: ClientId, mut writer: W, mut outbound: mpsc::Receiver<Payload>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(payload) = outbound.recv().await {
        if let Err(e) = writer.write_all(&payload).await {
            warn!("Failed to write to {}: {}", id, e);
            return Err(e);
        }
    }
    writer.shutdown().await
}
