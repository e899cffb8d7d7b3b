//! Harvest configuration, loadable from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! production setup: archives from the public BitMEX bucket, written under the
//! current directory, 10 attempts 10 seconds apart.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use bmex_core::data::{RetryPolicy, DEFAULT_ARCHIVE_BASE, DEFAULT_CATALOG_URL};

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Immutable settings injected into the harvester at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarvestConfig {
    /// Directory that receives the `BITMEX/` tree.
    pub output_root: PathBuf,

    /// Where decompressed spool files live while a day is routed.
    /// `None` uses the system temp directory.
    pub scratch_dir: Option<PathBuf>,

    /// Base URL of the archive bucket.
    pub base_url: String,

    /// Instrument catalog endpoint.
    pub catalog_url: String,

    /// Whole-request timeout for a single HTTP call.
    pub http_timeout_secs: u64,

    pub retry: RetrySettings,
}

/// Fixed-delay retry settings for archive downloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub delay_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            delay_secs: policy.delay.as_secs(),
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_secs(self.delay_secs))
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("."),
            scratch_dir: None,
            base_url: DEFAULT_ARCHIVE_BASE.to_string(),
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            http_timeout_secs: 600,
            retry: RetrySettings::default(),
        }
    }
}

impl HarvestConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: HarvestConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1".into()));
        }
        if self.http_timeout_secs == 0 {
            return Err(ConfigError::Invalid("http_timeout_secs must be positive".into()));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("base_url must not be empty".into()));
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.policy()
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
