//! Error types
//!
//! Connection-scoped failures stay inside their handler; only listener
//! failures (`Bind`, `Accept`, `Config`) reach the process entry point.

use std::fmt;
use std::io;

use crate::client::ClientId;

/// General relay server error
#[derive(Debug)]
pub enum RelayError {
    Bind { addr: String, source: io::Error },
    Accept(io::Error),
    Config(config::ConfigError),
    Io(io::Error),
    PeerGone(ClientId),
    PeerBacklogged(ClientId),
}

impl RelayError {
    /// Whether this error must terminate the process
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RelayError::Bind { .. } | RelayError::Accept(_) | RelayError::Config(_)
        )
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Bind { addr, source } => write!(f, "Failed to bind to {}: {}", addr, source),
            RelayError::Accept(e) => write!(f, "Failed to accept connection: {}", e),
            RelayError::Config(e) => write!(f, "Configuration error: {}", e),
            RelayError::Io(e) => write!(f, "I/O error: {}", e),
            RelayError::PeerGone(id) => write!(f, "Client {} is no longer writable", id),
            RelayError::PeerBacklogged(id) => write!(f, "Client {} outbound queue is full", id),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelayError::Bind { source, .. } => Some(source),
            RelayError::Accept(e) => Some(e),
            RelayError::Config(e) => Some(e),
            RelayError::Io(e) => Some(e),
            RelayError::PeerGone(_) | RelayError::PeerBacklogged(_) => None,
        }
    }
}

impl From<config::ConfigError> for RelayError {
    fn from(error: config::ConfigError) -> Self {
        RelayError::Config(error)
    }
}

impl From<io::Error> for RelayError {
    fn from(error: io::Error) -> Self {
        RelayError::Io(error)
    }
}
