use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("No command given")]
    EmptyCommand,

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to wait for '{command}': {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
