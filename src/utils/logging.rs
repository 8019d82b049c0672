//! Logging utilities
//!
//! Operator output goes through `log`; `env_logger` prints it. Defaults to
//! `info` so connection and message notices are visible without `RUST_LOG`.

use env_logger::Env;

const DEFAULT_FILTER: &str = "info";

/// Setup logging for the server
pub fn setup_logging() {
    env_logger::Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER))
        .format_timestamp_millis()
        .init();
}
