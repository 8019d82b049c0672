//! Broadcast engine
//!
//! Delivers a payload to every registered client except its sender. A
//! failing peer never aborts delivery to the others, and the engine never
//! removes entries: each peer's own handler owns its deregistration.

use log::warn;

use crate::client::{ClientId, Payload, SharedRegistry};

/// Outcome of a single broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct Broadcaster {
    registry: SharedRegistry,
}

impl Broadcaster {
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Queues `payload` for every client except `sender`.
    pub async fn broadcast(&self, sender: &ClientId, payload: Payload) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        self.registry
            .for_each_except(sender, |id, client| match client.send(Payload::clone(&payload)) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Dropping message from {} for {}: {}", sender, id, e);
                    report.failed += 1;
                }
            })
            .await;

        report
    }
}
