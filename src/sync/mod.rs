//! Synchronization primitives shared by the commit pipeline
//!
//! - `semaphore` - bounds the number of in-flight asynchronous commits
//! - `deadliner` - tracks the periodic flush deadline

pub mod deadliner;
pub mod semaphore;

pub use deadliner::Deadliner;
pub use semaphore::{CommitPermit, CommitSemaphore};
