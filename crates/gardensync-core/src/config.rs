//! Configuration module for gardensync.
//!
//! Provides typed configuration structs that map to the YAML configuration
//! file, with loading, validation, and defaults.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for gardensync.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncConfig,
    pub remote: RemoteConfig,
    pub logging: LoggingConfig,
}

/// Synchronization scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Milliseconds of quiet after the last local edit before a flush.
    pub debounce_delay_ms: u64,
    /// Milliseconds to wait before retrying a failed flush.
    pub retry_backoff_ms: u64,
    /// Flush attempts per delta before it is abandoned.
    pub attempt_limit: u32,
}

/// Remote sync endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URL of the sync backend.
    pub base_url: String,
    /// Seconds before an in-flight sync request is abandoned.
    pub request_timeout_secs: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_delay_ms: 2_000,
            retry_backoff_ms: 4_000,
            attempt_limit: 3,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl SyncConfig {
    /// Debounce quiet period as a [`Duration`].
    #[must_use]
    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_delay_ms)
    }

    /// Retry backoff as a [`Duration`].
    #[must_use]
    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

impl RemoteConfig {
    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    #[must_use]
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Checks that the configuration values are usable.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.sync.debounce_delay_ms == 0 {
            anyhow::bail!("sync.debounce_delay_ms must be greater than zero");
        }
        if self.sync.retry_backoff_ms == 0 {
            anyhow::bail!("sync.retry_backoff_ms must be greater than zero");
        }
        if self.sync.attempt_limit == 0 {
            anyhow::bail!("sync.attempt_limit must be at least 1");
        }
        if self.remote.base_url.trim().is_empty() {
            anyhow::bail!("remote.base_url must not be empty");
        }
        if self.remote.request_timeout_secs == 0 {
            anyhow::bail!("remote.request_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
