//! Runtime wiring
//!
//! Builds the storage backend, commit chain and flush buffer from an
//! [`AgentConfig`], launches the child process and drives it to completion.

use std::sync::Arc;
use tracing::{error, info};

use crate::agent::{Agent, RunReport};
use crate::app::config::AgentConfig;
use crate::buffer::FlushBuffer;
use crate::commit::{build_chain, ArtifactNamer, CommitStats, StorageCommitter};
use crate::error::{AgentError, Result, GENERAL_ERROR};
use crate::input::DeadlineReader;
use crate::storage::StorageFactory;
use crate::subprocess::{spawn, ExitStatus, ProcessCommandBuilder, ProcessError};
use crate::sync::Deadliner;

/// Name of this machine, used in every artifact name
pub fn local_hostname() -> Result<String> {
    let name = hostname::get().map_err(|e| AgentError::Hostname(e.to_string()))?;
    name.into_string()
        .map_err(|raw| AgentError::Hostname(format!("not valid UTF-8: {:?}", raw)))
}

/// Run `argv` and ship its output according to `config`
pub async fn run_agent<S: AsRef<str>>(config: &AgentConfig, argv: &[S]) -> Result<RunReport> {
    config.validate()?;

    let command = ProcessCommandBuilder::from_argv(argv)
        .ok_or(ProcessError::EmptyCommand)?
        .merge_stderr(config.merge_stderr)
        .build();
    let host = local_hostname()?;

    let store = StorageFactory::from_destination(&config.destination).await?;
    info!(
        "Shipping output of '{}' to {} (buffer {} bytes, period {}, {} concurrent writes)",
        command.display(),
        store.describe(),
        config.buffer_size,
        humantime::format_duration(config.period),
        config.concurrency
    );

    let namer = ArtifactNamer::new(config.destination.artifact_prefix(), host);
    let deadliner = Arc::new(Deadliner::new(config.period));
    let stats = Arc::new(CommitStats::default());
    let (chain, drain) = build_chain(
        StorageCommitter::new(store, namer),
        Arc::clone(&deadliner),
        config.concurrency,
        Arc::clone(&stats),
    );
    let buffer = FlushBuffer::new(config.buffer_size, chain);

    let child = spawn(&command)?;
    let reader = DeadlineReader::new(child.output, Arc::clone(&deadliner)).with_process(child.process);

    Agent::new(buffer, deadliner, drain, stats).run(reader).await
}

/// Exit code the agent should terminate with after a run.
///
/// A failing child's own exit code is passed through; a signal maps to the
/// shell convention of 128 plus the signal number.
pub fn exit_code(report: &RunReport) -> i32 {
    match report.exit_status {
        Some(ExitStatus::Error(code)) => code,
        Some(ExitStatus::Signal(signal)) => 128 + signal,
        Some(ExitStatus::Success) | None => {
            if report.stream_end.is_clean() {
                0
            } else {
                error!("Output stream of the command failed");
                GENERAL_ERROR
            }
        }
    }
}
