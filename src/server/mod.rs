//! Server core functionality
//!
//! Binds the listening socket and dispatches accepted connections to
//! their handlers.

pub mod core;

pub use self::core::Server;
