//! Agent configuration
//!
//! Settings come from an optional TOML file and are then overridden by
//! command-line flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::error::{AgentError, Result};
use crate::storage::Destination;

const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;
const DEFAULT_PERIOD: Duration = Duration::from_secs(2);
const DEFAULT_CONCURRENCY: usize = 4;
/// Longest accepted flush period
pub const MAX_PERIOD: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Runtime settings of the shipping agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// Capacity of the flush buffer in bytes
    pub buffer_size: usize,
    /// Maximum time between commits while output keeps arriving
    #[serde(with = "humantime_serde")]
    pub period: Duration,
    /// Maximum number of storage writes in flight
    pub concurrency: usize,
    /// Read the child's stderr through the same pipe as stdout
    pub merge_stderr: bool,
    pub destination: Destination,
    /// Verbosity level for logging, only ever set from the command line
    #[serde(skip)]
    pub verbose: u8,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            period: DEFAULT_PERIOD,
            concurrency: DEFAULT_CONCURRENCY,
            merge_stderr: true,
            destination: Destination::default(),
            verbose: 0,
        }
    }
}

/// Values given on the command line; `None` keeps the configured value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub buffer_size: Option<usize>,
    pub period: Option<Duration>,
    pub concurrency: Option<usize>,
    pub dir: Option<PathBuf>,
    pub bucket: Option<String>,
    pub prefix: Option<String>,
    pub endpoint: Option<String>,
    pub no_merge_stderr: bool,
}

impl AgentConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load the file at `path`, or the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        debug!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(|e| {
            AgentError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&text)
    }

    /// Apply command-line overrides on top of the loaded values
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Result<Self> {
        if let Some(buffer_size) = overrides.buffer_size {
            self.buffer_size = buffer_size;
        }
        if let Some(period) = overrides.period {
            self.period = period;
        }
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = concurrency;
        }
        if overrides.no_merge_stderr {
            self.merge_stderr = false;
        }

        match (overrides.dir, overrides.bucket) {
            (Some(_), Some(_)) => {
                return Err(AgentError::config(
                    "--dir and --bucket select different destinations",
                ))
            }
            (Some(dir), None) => self.destination = Destination::File { dir },
            (None, Some(bucket)) => {
                let (prefix, endpoint) = match self.destination {
                    Destination::S3 {
                        prefix, endpoint, ..
                    } => (prefix, endpoint),
                    Destination::File { .. } => ("logs".to_string(), None),
                };
                self.destination = Destination::S3 {
                    bucket,
                    prefix,
                    endpoint,
                };
            }
            (None, None) => {}
        }

        match &mut self.destination {
            Destination::S3 {
                prefix, endpoint, ..
            } => {
                if let Some(p) = overrides.prefix {
                    *prefix = p;
                }
                if let Some(e) = overrides.endpoint {
                    *endpoint = Some(e);
                }
            }
            Destination::File { .. } => {
                if overrides.prefix.is_some() || overrides.endpoint.is_some() {
                    return Err(AgentError::config(
                        "--prefix and --endpoint only apply to an S3 destination",
                    ));
                }
            }
        }

        Ok(self)
    }

    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.buffer_size == 0 {
            return Err(AgentError::config("buffer size must be greater than zero"));
        }
        if self.period.is_zero() {
            return Err(AgentError::config("period must be greater than zero"));
        }
        if self.period > MAX_PERIOD {
            return Err(AgentError::config(format!(
                "period must not exceed {}",
                humantime::format_duration(MAX_PERIOD)
            )));
        }
        if self.concurrency == 0 {
            return Err(AgentError::config("concurrency must be greater than zero"));
        }
        if u32::try_from(self.concurrency).is_err() {
            return Err(AgentError::config(format!(
                "concurrency {} is too large",
                self.concurrency
            )));
        }
        if let Destination::S3 { bucket, .. } = &self.destination {
            if bucket.is_empty() {
                return Err(AgentError::config("bucket name must not be empty"));
            }
        }
        Ok(())
    }

    /// Get the log level string based on verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            2 => "trace",
            _ => "trace,aws_config=debug,aws_smithy_runtime=debug,hyper=debug",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.buffer_size, 1024 * 1024);
        assert_eq!(config.period, Duration::from_secs(2));
        assert_eq!(config.concurrency, 4);
        assert!(config.merge_stderr);
        assert_eq!(
            config.destination,
            Destination::File {
                dir: PathBuf::from("logs")
            }
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml() {
        let config = AgentConfig::from_toml(
            r#"
buffer_size = 4096
period = "500ms"
merge_stderr = false

[destination]
backend = "s3"
bucket = "fleet-logs"
prefix = "web"
"#,
        )
        .unwrap();

        assert_eq!(config.buffer_size, 4096);
        assert_eq!(config.period, Duration::from_millis(500));
        assert_eq!(config.concurrency, 4);
        assert!(!config.merge_stderr);
        assert_eq!(config.destination.artifact_prefix(), "web");
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = AgentConfig::from_toml("buffer = 10").unwrap_err();
        assert!(matches!(err, AgentError::Toml(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "concurrency = 8").unwrap();

        let config = AgentConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.concurrency, 8);

        let missing = AgentConfig::load(Some(Path::new("/nonexistent/s4log.toml")));
        assert!(matches!(missing, Err(AgentError::Config(_))));
    }

    #[test]
    fn test_overrides_win() {
        let config = AgentConfig::from_toml("period = \"10s\"")
            .unwrap()
            .with_overrides(ConfigOverrides {
                period: Some(Duration::from_secs(1)),
                concurrency: Some(2),
                no_merge_stderr: true,
                ..Default::default()
            })
            .unwrap();

        assert_eq!(config.period, Duration::from_secs(1));
        assert_eq!(config.concurrency, 2);
        assert!(!config.merge_stderr);
    }

    #[test]
    fn test_bucket_override_selects_s3() {
        let config = AgentConfig::default()
            .with_overrides(ConfigOverrides {
                bucket: Some("bucket".to_string()),
                prefix: Some("hosts".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(
            config.destination,
            Destination::S3 {
                bucket: "bucket".to_string(),
                prefix: "hosts".to_string(),
                endpoint: None,
            }
        );
    }

    #[test]
    fn test_conflicting_destinations() {
        let result = AgentConfig::default().with_overrides(ConfigOverrides {
            dir: Some(PathBuf::from("out")),
            bucket: Some("bucket".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(AgentError::Config(_))));

        let result = AgentConfig::default().with_overrides(ConfigOverrides {
            prefix: Some("p".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(AgentError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zeros() {
        for config in [
            AgentConfig {
                buffer_size: 0,
                ..Default::default()
            },
            AgentConfig {
                period: Duration::ZERO,
                ..Default::default()
            },
            AgentConfig {
                concurrency: 0,
                ..Default::default()
            },
        ] {
            let err = config.validate().unwrap_err();
            assert_eq!(err.exit_code(), 2);
        }
    }

    #[test]
    fn test_validate_rejects_huge_period() {
        let config = AgentConfig {
            period: humantime::parse_duration("400000000000years").unwrap(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AgentError::Config(_)));
        assert_eq!(err.exit_code(), 2);

        let config = AgentConfig {
            period: MAX_PERIOD,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_level_ladder() {
        assert_eq!(AgentConfig::default().log_level(), "info");
        assert_eq!(AgentConfig::default().with_verbose(1).log_level(), "debug");
        assert_eq!(AgentConfig::default().with_verbose(2).log_level(), "trace");
        assert!(AgentConfig::default()
            .with_verbose(5)
            .log_level()
            .starts_with("trace"));
    }
}
