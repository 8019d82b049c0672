//! TCP broadcast relay
//!
//! Every chunk a client sends is forwarded, byte for byte, to every other
//! connected client. Chunks longer than the configured limit get the sender
//! disconnected.

pub mod client;
pub mod config;
pub mod error;
pub mod relay;
pub mod server;
pub mod utils;

pub use client::{ClientRegistry, SharedRegistry};
pub use config::RelayConfig;
pub use error::RelayError;
pub use server::Server;
