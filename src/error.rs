use thiserror::Error;

use crate::storage::StorageError;
use crate::subprocess::ProcessError;

/// Exit code for invalid arguments or configuration
pub const ARGUMENT_ERROR: i32 = 2;
/// Exit code for everything else
pub const GENERAL_ERROR: i32 = 1;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unable to determine hostname: {0}")]
    Hostname(String),

    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Reader task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl AgentError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Toml(_) => ARGUMENT_ERROR,
            Self::Process(ProcessError::EmptyCommand) => ARGUMENT_ERROR,
            Self::Storage(e) if e.is_configuration() => ARGUMENT_ERROR,
            _ => GENERAL_ERROR,
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(AgentError::config("zero period").exit_code(), ARGUMENT_ERROR);
        assert_eq!(
            AgentError::from(ProcessError::EmptyCommand).exit_code(),
            ARGUMENT_ERROR
        );
        assert_eq!(
            AgentError::from(StorageError::configuration("s3 disabled")).exit_code(),
            ARGUMENT_ERROR
        );
        assert_eq!(
            AgentError::from(StorageError::backend("denied")).exit_code(),
            GENERAL_ERROR
        );
        assert_eq!(
            AgentError::Hostname("no name".to_string()).exit_code(),
            GENERAL_ERROR
        );
    }
}
