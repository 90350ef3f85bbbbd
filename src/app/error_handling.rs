//! Error handling utilities

use tracing::error;

use crate::error::{AgentError, GENERAL_ERROR};

/// Handle fatal errors and exit with appropriate status code
///
/// - `verbose = 0`: the error message only
/// - `verbose >= 1`: the full error chain as well
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);
    eprintln!("Error: {error}");

    if verbose >= 1 {
        eprintln!("\nError chain:");
        for (i, cause) in error.chain().enumerate() {
            eprintln!("  {}: {}", i, cause);
        }
    }

    std::process::exit(exit_code_for(&error))
}

/// Exit code for an error, using the agent's own mapping when available
pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    error
        .downcast_ref::<AgentError>()
        .map(AgentError::exit_code)
        .unwrap_or(GENERAL_ERROR)
}
