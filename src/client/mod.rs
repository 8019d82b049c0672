//! Client management
//!
//! Connection identity, the live-client registry, and the per-connection
//! handler that drives a client from accept to teardown.

pub mod handler;
pub mod registry;
pub mod state;

pub use handler::{ConnectionHandler, ConnectionState, DataOutcome};
pub use registry::{ClientRegistry, SharedRegistry};
pub use state::{Client, ClientId, Payload};
