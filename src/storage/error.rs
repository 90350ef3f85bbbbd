//! Error types for the artifact storage layer

use std::fmt;
use thiserror::Error;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Storage backend rejected or failed the write
    #[error("Backend error: {0}")]
    Backend(String),

    /// Storage backend unavailable (injected in tests, or a disabled feature)
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Create a configuration error
    pub fn configuration<E: fmt::Display>(msg: E) -> Self {
        Self::Configuration(msg.to_string())
    }

    /// Create a connection error
    pub fn connection<E: fmt::Display>(msg: E) -> Self {
        Self::Connection(msg.to_string())
    }

    /// Create a backend error
    pub fn backend<E: fmt::Display>(msg: E) -> Self {
        Self::Backend(msg.to_string())
    }

    /// Create an unavailable error
    pub fn unavailable<E: fmt::Display>(msg: E) -> Self {
        Self::Unavailable(msg.to_string())
    }

    /// Whether the error is caused by configuration rather than the write itself
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}
