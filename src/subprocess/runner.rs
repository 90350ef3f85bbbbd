//! Child process launcher
//!
//! Spawns the command whose output is shipped and hands back its output
//! stream plus a handle that reaps the process.

use std::process::Stdio;
use tokio::io::AsyncRead;

use super::error::ProcessError;

#[derive(Debug, Clone)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
    pub merge_stderr: bool,
}

impl ProcessCommand {
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Error(i32),
    Signal(i32),
}

impl ExitStatus {
    pub fn success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitStatus::Success => Some(0),
            ExitStatus::Error(code) => Some(*code),
            ExitStatus::Signal(_) => None,
        }
    }

    /// Convert process exit status to our ExitStatus enum
    fn from_std(status: std::process::ExitStatus) -> Self {
        if status.success() {
            ExitStatus::Success
        } else if let Some(code) = status.code() {
            ExitStatus::Error(code)
        } else {
            Self::from_signal(status)
        }
    }

    #[cfg(unix)]
    fn from_signal(status: std::process::ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            ExitStatus::Signal(signal)
        } else {
            ExitStatus::Error(1)
        }
    }

    #[cfg(not(unix))]
    fn from_signal(_status: std::process::ExitStatus) -> Self {
        ExitStatus::Error(1)
    }
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitStatus::Success => write!(f, "exit code 0"),
            ExitStatus::Error(code) => write!(f, "exit code {}", code),
            ExitStatus::Signal(signal) => write!(f, "signal {}", signal),
        }
    }
}

/// Readable side of the child's output
pub type ChildOutput = Box<dyn AsyncRead + Send + Unpin>;

/// A running child process
#[derive(Debug)]
pub struct ChildProcess {
    child: tokio::process::Child,
    command: String,
}

impl ChildProcess {
    /// Wait for the process to exit and reap it
    pub async fn wait(mut self) -> Result<ExitStatus, ProcessError> {
        let status = self.child.wait().await.map_err(|source| ProcessError::Wait {
            command: self.command.clone(),
            source,
        })?;
        let status = ExitStatus::from_std(status);

        match status {
            ExitStatus::Success => tracing::debug!("Command exited successfully: {}", self.command),
            ExitStatus::Error(code) => {
                tracing::warn!("Command exited with code {}: {}", code, self.command)
            }
            ExitStatus::Signal(signal) => {
                tracing::warn!("Command terminated by signal {}: {}", signal, self.command)
            }
        }
        Ok(status)
    }
}

/// Output stream and process handle of a spawned command
pub struct ChildStream {
    pub output: ChildOutput,
    pub process: ChildProcess,
}

/// Spawn `command` with its stdout (and, when merging, stderr) piped
pub fn spawn(command: &ProcessCommand) -> Result<ChildStream, ProcessError> {
    if command.program.is_empty() {
        return Err(ProcessError::EmptyCommand);
    }
    tracing::debug!("Executing subprocess: {}", command.display());

    let mut cmd = tokio::process::Command::new(&command.program);
    cmd.args(&command.args).stdin(Stdio::null());

    let merged = if command.merge_stderr {
        attach_merged_pipe(&mut cmd)?
    } else {
        cmd.stdout(Stdio::piped()).stderr(Stdio::inherit());
        None
    };

    let mut child = cmd
        .spawn()
        .map_err(|e| map_spawn_error(e, &command.program))?;
    // Close our copies of the pipe's write end so EOF arrives when the child exits.
    drop(cmd);

    let output: ChildOutput = match merged {
        Some(reader) => reader,
        None => match child.stdout.take() {
            Some(stdout) => Box::new(stdout),
            None => {
                return Err(ProcessError::Io(std::io::Error::other(
                    "child stdout was not captured",
                )))
            }
        },
    };

    tracing::info!(
        "Started {} (pid {})",
        command.display(),
        child.id().map(|id| id.to_string()).unwrap_or_default()
    );

    Ok(ChildStream {
        output,
        process: ChildProcess {
            child,
            command: command.display(),
        },
    })
}

/// Point stdout and stderr at one pipe and return its read end
#[cfg(unix)]
fn attach_merged_pipe(
    cmd: &mut tokio::process::Command,
) -> Result<Option<ChildOutput>, ProcessError> {
    use std::os::fd::OwnedFd;
    use tokio::net::unix::pipe;

    let (reader, writer) = std::io::pipe()?;
    cmd.stdout(writer.try_clone()?);
    cmd.stderr(writer);

    let receiver = pipe::Receiver::from_owned_fd(OwnedFd::from(reader))?;
    Ok(Some(Box::new(receiver)))
}

#[cfg(not(unix))]
fn attach_merged_pipe(
    cmd: &mut tokio::process::Command,
) -> Result<Option<ChildOutput>, ProcessError> {
    tracing::warn!("Merging stderr is not supported on this platform; stderr is inherited");
    cmd.stdout(Stdio::piped()).stderr(Stdio::inherit());
    Ok(None)
}

/// Map spawn error to ProcessError
fn map_spawn_error(error: std::io::Error, program: &str) -> ProcessError {
    if error.kind() == std::io::ErrorKind::NotFound {
        ProcessError::CommandNotFound(program.to_string())
    } else {
        ProcessError::Spawn {
            command: program.to_string(),
            source: error,
        }
    }
}
