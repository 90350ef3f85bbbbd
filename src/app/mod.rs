//! Application module
//!
//! - `config` - configuration file and command-line overrides
//! - `logging` - tracing setup
//! - `error_handling` - fatal error reporting and exit codes
//! - `runtime` - wiring the pipeline and running the child

pub mod config;
pub mod error_handling;
pub mod logging;
pub mod runtime;

pub use config::{AgentConfig, ConfigOverrides};
pub use error_handling::handle_fatal_error;
pub use logging::init_logging;
pub use runtime::{exit_code, local_hostname, run_agent};
