//! Logging configuration and initialization
//!
//! Logs always go to stderr; stdout is left alone.

use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

use crate::app::config::AgentConfig;

/// Initialize tracing for the agent.
///
/// `RUST_LOG`, when set, takes precedence over the verbosity flags.
pub fn init_logging(config: &AgentConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level()));

    let initialized = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(config.verbose >= 2) // Show target module for -vv and above
        .with_thread_ids(config.verbose >= 3) // Show thread IDs for -vvv
        .with_line_number(config.verbose >= 3) // Show line numbers for -vvv
        .try_init();

    if initialized.is_err() {
        // A subscriber is already installed (tests, embedding).
        return;
    }

    debug!("s4log started with verbosity level: {}", config.verbose);
    trace!("Full CLI args: {:?}", std::env::args().collect::<Vec<_>>());
}
