//! Client registry
//!
//! Tracks every currently open connection, keyed by `ClientId`. Shared
//! between the listener and all connection handlers via `SharedRegistry`.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::client::{Client, ClientId};

pub type SharedRegistry = Arc<ClientRegistry>;

/// Registry for tracking live clients
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<ClientId, Client>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedRegistry {
        Arc::new(Self::new())
    }

    /// Inserts `client` under `id`, replacing and returning any previous entry.
    pub async fn add(&self, id: ClientId, client: Client) -> Option<Client> {
        self.clients.lock().await.insert(id, client)
    }

    /// Removes the entry for `id`. Returns false if it was already gone.
    pub async fn remove(&self, id: &ClientId) -> bool {
        self.clients.lock().await.remove(id).is_some()
    }

    /// Removes the entry for `id` only if it still belongs to connection `serial`.
    ///
    /// A stale connection tearing down after the same address reconnected
    /// leaves the newer entry in place.
    pub async fn remove_if_current(&self, id: &ClientId, serial: u64) -> bool {
        let mut clients = self.clients.lock().await;
        match clients.get(id) {
            Some(client) if client.serial() == serial => {
                clients.remove(id);
                true
            }
            _ => false,
        }
    }

    /// Calls `f` for every client except `exclude`.
    ///
    /// Runs over a snapshot taken under the lock; the lock is released before
    /// `f` is invoked, so `f` may touch the registry freely.
    pub async fn for_each_except<F>(&self, exclude: &ClientId, mut f: F)
    where
        F: FnMut(&ClientId, &Client),
    {
        let targets: Vec<(ClientId, Client)> = {
            let clients = self.clients.lock().await;
            clients
                .iter()
                .filter(|(id, _)| *id != exclude)
                .map(|(id, client)| (*id, client.clone()))
                .collect()
        };

        for (id, client) in &targets {
            f(id, client);
        }
    }

    pub async fn contains(&self, id: &ClientId) -> bool {
        self.clients.lock().await.contains_key(id)
    }

    pub async fn ids(&self) -> Vec<ClientId> {
        self.clients.lock().await.keys().copied().collect()
    }

    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Payload;
    use std::collections::HashSet;
    use std::net::SocketAddr;
    use tokio::sync::mpsc;

    fn client(port: u16, serial: u64) -> (ClientId, Client, mpsc::Receiver<Payload>) {
        let id = ClientId::from(format!("127.0.0.1:{}", port).parse::<SocketAddr>().unwrap());
        let (tx, rx) = mpsc::channel(16);
        (id, Client::new(id, serial, tx), rx)
    }

    #[tokio::test]
    async fn test_add_and_remove() {
        let registry = ClientRegistry::new();
        let (id, c, _rx) = client(5001, 1);

        assert!(registry.add(id, c).await.is_none());
        assert!(registry.contains(&id).await);
        assert_eq!(registry.len().await, 1);

        assert!(registry.remove(&id).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let registry = ClientRegistry::new();
        let (id, c, _rx) = client(5002, 1);
        registry.add(id, c).await;

        assert!(registry.remove(&id).await);
        assert!(!registry.remove(&id).await);
        assert!(!registry.remove(&id).await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_add_overwrites_existing_id() {
        let registry = ClientRegistry::new();
        let (id, first, _rx1) = client(5003, 1);
        let (_, second, _rx2) = client(5003, 2);

        registry.add(id, first).await;
        let replaced = registry.add(id, second).await;

        assert_eq!(replaced.map(|c| c.serial()), Some(1));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_stale_connection_does_not_evict_newer_entry() {
        let registry = ClientRegistry::new();
        let (id, old, _rx1) = client(5004, 1);
        let (_, new, _rx2) = client(5004, 2);

        registry.add(id, old).await;
        registry.add(id, new).await;

        assert!(!registry.remove_if_current(&id, 1).await);
        assert!(registry.contains(&id).await);
        assert!(registry.remove_if_current(&id, 2).await);
        assert!(!registry.contains(&id).await);
    }

    #[tokio::test]
    async fn test_for_each_except_skips_excluded() {
        let registry = ClientRegistry::new();
        let mut receivers = Vec::new();
        let mut ids = Vec::new();
        for (serial, port) in (5010..5014).enumerate() {
            let (id, c, rx) = client(port, serial as u64);
            registry.add(id, c).await;
            ids.push(id);
            receivers.push(rx);
        }

        let mut visited = HashSet::new();
        registry
            .for_each_except(&ids[0], |id, _| {
                visited.insert(*id);
            })
            .await;

        let expected: HashSet<ClientId> = ids[1..].iter().copied().collect();
        assert_eq!(visited, expected);
    }

    #[tokio::test]
    async fn test_lock_released_during_callback() {
        let registry = ClientRegistry::new();
        let (a, ca, _rxa) = client(5020, 1);
        let (b, cb, _rxb) = client(5021, 2);
        registry.add(a, ca).await;
        registry.add(b, cb).await;

        let mut calls = 0;
        registry
            .for_each_except(&a, |_, _| {
                assert!(registry.clients.try_lock().is_ok());
                calls += 1;
            })
            .await;

        assert_eq!(calls, 1);
    }
}
