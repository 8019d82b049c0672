//! Message relay
//!
//! Fans inbound chunks out to every other connected client.

pub mod broadcast;

pub use broadcast::{BroadcastReport, Broadcaster};
