use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::client::SharedRegistry;
use crate::client::handler::handle_client;
use crate::config::RelayConfig;
use crate::error::RelayError;
use crate::relay::Broadcaster;

pub struct Server {
    listener: TcpListener,
    broadcaster: Broadcaster,
    config: Arc<RelayConfig>,
    next_serial: u64,
}

impl Server {
    /// Binds the configured `host:port`. A bind failure is fatal to the caller.
    pub async fn bind(config: RelayConfig, registry: SharedRegistry) -> Result<Self, RelayError> {
        let addr = config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| RelayError::Bind { addr: addr.clone(), source })?;

        info!("Listening on {}", addr);

        Ok(Self {
            listener,
            broadcaster: Broadcaster::new(registry),
            config: Arc::new(config),
            next_serial: 0,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, RelayError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> &SharedRegistry {
        self.broadcaster.registry()
    }

    /// Accepts connections until the listener fails. An accept error is a
    /// listener-level failure and ends the loop with `RelayError::Accept`.
    pub async fn run(mut self) -> Result<(), RelayError> {
        loop {
            let (stream, _addr) = self.listener.accept().await.map_err(RelayError::Accept)?;

            self.next_serial += 1;
            let serial = self.next_serial;
            let broadcaster = self.broadcaster.clone();
            let config = Arc::clone(&self.config);

            // Spawn a task for each client so accept loop doesn't block
            tokio::spawn(async move {
                handle_client(stream, serial, broadcaster, config).await;
            });
        }
    }
}
