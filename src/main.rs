use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use s4log::app::{
    exit_code, handle_fatal_error, init_logging, run_agent, AgentConfig, ConfigOverrides,
};

/// Run a command and ship its output to storage in line-aligned batches
#[derive(Parser)]
#[command(name = "s4log", version)]
#[command(about = "Run a command and ship its output to storage in line-aligned batches", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Flush buffer capacity in bytes (default: 1048576)
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Maximum time between commits, e.g. "2s" or "500ms" (default: 2s)
    #[arg(long, value_parser = humantime::parse_duration)]
    period: Option<Duration>,

    /// Maximum number of concurrent storage writes (default: 4)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Write artifacts into this directory (default: logs)
    #[arg(long, conflicts_with = "bucket")]
    dir: Option<PathBuf>,

    /// Write artifacts to this S3 bucket (requires the s3 feature)
    #[arg(long)]
    bucket: Option<String>,

    /// Key prefix inside the bucket (default: logs)
    #[arg(long)]
    prefix: Option<String>,

    /// Custom endpoint for S3-compatible stores
    #[arg(long)]
    endpoint: Option<String>,

    /// Leave the command's stderr on the terminal instead of shipping it
    #[arg(long)]
    no_merge_stderr: bool,

    /// Command to run, followed by its arguments
    #[arg(
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    command: Vec<String>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            buffer_size: self.buffer_size,
            period: self.period,
            concurrency: self.concurrency,
            dir: self.dir.clone(),
            bucket: self.bucket.clone(),
            prefix: self.prefix.clone(),
            endpoint: self.endpoint.clone(),
            no_merge_stderr: self.no_merge_stderr,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => handle_fatal_error(e, verbose),
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = AgentConfig::load(cli.config.as_deref())?
        .with_overrides(cli.overrides())?
        .with_verbose(cli.verbose);
    init_logging(&config);

    let report = run_agent(&config, cli.command.as_slice()).await?;
    Ok(exit_code(&report))
}
