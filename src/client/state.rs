//! Module `state`
//!
//! Defines the connected-peer types kept in the registry: the immutable
//! `ClientId` key and the `Client` entry holding the peer's write handle.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::RelayError;

/// Raw bytes relayed between peers, shared across all recipients.
pub type Payload = Arc<[u8]>;

/// Identity of a connection, derived once from the remote `address:port`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(SocketAddr);

impl From<SocketAddr> for ClientId {
    fn from(addr: SocketAddr) -> Self {
        Self(addr)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0.ip(), self.0.port())
    }
}

/// Registry entry for one connected peer.
///
/// The sender feeds the connection's writer task, so writing to a client
/// never blocks the caller. The queue is bounded: a peer that stops reading
/// misses messages instead of growing it.
#[derive(Debug, Clone)]
pub struct Client {
    id: ClientId,
    serial: u64,
    outbound: mpsc::Sender<Payload>,
}

impl Client {
    pub fn new(id: ClientId, serial: u64, outbound: mpsc::Sender<Payload>) -> Self {
        Self { id, serial, outbound }
    }

    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Monotonic number assigned by the listener at accept time.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Queues `payload` for delivery to this client without waiting.
    pub fn send(&self, payload: Payload) -> Result<(), RelayError> {
        self.outbound.try_send(payload).map_err(|e| match e {
            TrySendError::Full(_) => RelayError::PeerBacklogged(self.id),
            TrySendError::Closed(_) => RelayError::PeerGone(self.id),
        })
    }
}
