//! Destination configuration for committed artifacts

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where committed batches are written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum Destination {
    /// Local directory (default)
    File {
        #[serde(default = "default_dir")]
        dir: PathBuf,
    },
    /// Object store bucket + key prefix
    S3 {
        bucket: String,
        #[serde(default = "default_prefix")]
        prefix: String,
        /// Custom endpoint URL (S3-compatible stores)
        #[serde(default)]
        endpoint: Option<String>,
    },
}

impl Default for Destination {
    fn default() -> Self {
        Self::File { dir: default_dir() }
    }
}

impl Destination {
    /// Prefix placed in front of every artifact name.
    ///
    /// Empty for a directory: the file backend places names inside its
    /// directory itself.
    pub fn artifact_prefix(&self) -> String {
        match self {
            Self::File { .. } => String::new(),
            Self::S3 { prefix, .. } => prefix.trim_matches('/').to_string(),
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_prefix() -> String {
    "logs".to_string()
}
