//! Error handlers

use crate::error::types::RelayError;
use log::error;

/// Exit status used when the server cannot start or keep listening
pub const FATAL_EXIT_CODE: i32 = 1;

/// Report a server-level error to the operator
pub fn handle_server_error(err: &RelayError) {
    error!("Unexpected server error: {}", err);
}

/// Report a fatal server error and terminate the process
pub fn exit_on_fatal(err: RelayError) -> ! {
    handle_server_error(&err);
    std::process::exit(FATAL_EXIT_CODE);
}
