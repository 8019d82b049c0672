//! Relay Chat Server - Entry Point

use log::info;

use relay_chat_server::error::handlers::exit_on_fatal;
use relay_chat_server::utils::logging::setup_logging;
use relay_chat_server::{ClientRegistry, RelayConfig, RelayError, Server};

#[tokio::main]
async fn main() {
    setup_logging();

    let config = match RelayConfig::load() {
        Ok(config) => config,
        Err(e) => exit_on_fatal(RelayError::from(e)),
    };

    info!("Launching relay server...");

    let server = match Server::bind(config, ClientRegistry::shared()).await {
        Ok(server) => server,
        Err(e) => exit_on_fatal(e),
    };

    if let Err(e) = server.run().await {
        exit_on_fatal(e);
    }
}
