//! # s4log
//!
//! Runs a command and ships its output to durable storage in line-aligned
//! batches, each batch becoming a new immutable artifact.
//!
//! ## Usage
//!
//! ```bash
//! s4log [--dir logs | --bucket name] [--period 2s] -- command [args...]
//! ```
//!
//! ## Modules
//!
//! - `agent` - drive loop tying reader, buffer and deadline together
//! - `app` - configuration, logging and runtime wiring for the binary
//! - `buffer` - fixed-capacity flush buffer
//! - `commit` - composable commit policies
//! - `input` - deadline-bounded reads
//! - `storage` - artifact storage backends
//! - `subprocess` - launching the command and reaping it
//! - `sync` - concurrency limiter and flush deadline
pub mod agent;
pub mod app;
pub mod buffer;
pub mod commit;
pub mod error;
pub mod input;
pub mod storage;
pub mod subprocess;
pub mod sync;

pub use error::{AgentError, Result};
