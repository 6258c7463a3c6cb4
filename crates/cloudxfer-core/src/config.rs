//! Configuration module for cloudxfer.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.
//! [`TransferConfig`] is the small per-batch struct handed to the engine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::transfer::{DuplicateMode, Region};

/// Default number of parallel workers per batch
pub const DEFAULT_WORKERS: usize = 4;

/// Upper bound for `transfer.workers`
pub const MAX_WORKERS: usize = 32;

/// Default streaming chunk size (8 KiB)
pub const DEFAULT_CHUNK_SIZE_KIB: usize = 8;

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for cloudxfer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transfer: TransferSection,
    pub api: ApiConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
}

/// Batch transfer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferSection {
    /// Number of concurrent workers per batch (1..=32).
    pub workers: usize,
    /// Policy for same-named files at the destination.
    pub duplicate_mode: DuplicateMode,
    /// Streaming buffer size in KiB.
    pub chunk_size_kib: usize,
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API region selecting the base URL.
    pub region: Region,
    /// Timeout for metadata calls (listing, links, folder creation), in seconds.
    pub metadata_timeout_secs: u64,
    /// Timeout for data transfer calls (upload, download body), in seconds.
    pub transfer_timeout_secs: u64,
    /// TCP/TLS connect timeout, in seconds.
    pub connect_timeout_secs: u64,
}

/// Retry and backoff settings for transient failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per request, including the first.
    pub max_attempts: u32,
    /// Wait before the second attempt, in milliseconds; doubles afterwards.
    pub base_delay_ms: u64,
    /// Upper bound for any single wait, in milliseconds.
    pub max_delay_ms: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

/// Credential storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Fallback token cache used when the OS keyring is unavailable.
    pub token_cache_file: PathBuf,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for TransferSection {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            duplicate_mode: DuplicateMode::Rename,
            chunk_size_kib: DEFAULT_CHUNK_SIZE_KIB,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            region: Region::Us,
            metadata_timeout_secs: 30,
            transfer_timeout_secs: 300,
            connect_timeout_secs: 30,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
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

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_cache_file: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("~/.cache"))
                .join("cloudxfer")
                .join("auth_token.json"),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/cloudxfer/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("cloudxfer")
            .join("config.yaml")
    }

    /// The per-batch settings the engine consumes.
    pub fn transfer_config(&self) -> TransferConfig {
        TransferConfig {
            workers: self.transfer.workers.clamp(1, MAX_WORKERS),
            duplicate_mode: self.transfer.duplicate_mode,
            region: self.api.region,
            chunk_size: self.transfer.chunk_size_kib.max(1) * 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"transfer.workers"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- transfer ---
        if self.transfer.workers == 0 || self.transfer.workers > MAX_WORKERS {
            errors.push(ValidationError {
                field: "transfer.workers".into(),
                message: format!("must be in range 1..={MAX_WORKERS}"),
            });
        }
        if self.transfer.chunk_size_kib == 0 {
            errors.push(ValidationError {
                field: "transfer.chunk_size_kib".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- api ---
        if self.api.metadata_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "api.metadata_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.api.transfer_timeout_secs < self.api.metadata_timeout_secs {
            errors.push(ValidationError {
                field: "api.transfer_timeout_secs".into(),
                message: format!(
                    "transfer timeout ({}) must not be shorter than metadata timeout ({})",
                    self.api.transfer_timeout_secs, self.api.metadata_timeout_secs
                ),
            });
        }
        if self.api.connect_timeout_secs == 0 {
            errors.push(ValidationError {
                field: "api.connect_timeout_secs".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- retry ---
        if self.retry.max_attempts == 0 {
            errors.push(ValidationError {
                field: "retry.max_attempts".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            errors.push(ValidationError {
                field: "retry.base_delay_ms".into(),
                message: format!(
                    "base delay ({}) must not exceed max delay ({})",
                    self.retry.base_delay_ms, self.retry.max_delay_ms
                ),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// TransferConfig
// ---------------------------------------------------------------------------

/// Settings of one batch call, immutable for the duration of the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferConfig {
    pub workers: usize,
    pub duplicate_mode: DuplicateMode,
    pub region: Region,
    /// Streaming buffer size in bytes.
    pub chunk_size: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            duplicate_mode: DuplicateMode::Rename,
            region: Region::Us,
            chunk_size: DEFAULT_CHUNK_SIZE_KIB * 1024,
        }
    }
}

impl TransferConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.clamp(1, MAX_WORKERS);
        self
    }

    pub fn with_duplicate_mode(mut self, mode: DuplicateMode) -> Self {
        self.duplicate_mode = mode;
        self
    }

    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }
}

impl ApiConfig {
    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_secs(self.transfer_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust
/// use cloudxfer_core::config::ConfigBuilder;
/// use cloudxfer_core::domain::{DuplicateMode, Region};
///
/// let config = ConfigBuilder::new()
///     .workers(8)
///     .duplicate_mode(DuplicateMode::Skip)
///     .region(Region::Eu)
///     .build();
/// assert_eq!(config.transfer.workers, 8);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- transfer ---

    pub fn workers(mut self, n: usize) -> Self {
        self.config.transfer.workers = n;
        self
    }

    pub fn duplicate_mode(mut self, mode: DuplicateMode) -> Self {
        self.config.transfer.duplicate_mode = mode;
        self
    }

    pub fn chunk_size_kib(mut self, kib: usize) -> Self {
        self.config.transfer.chunk_size_kib = kib;
        self
    }

    // --- api ---

    pub fn region(mut self, region: Region) -> Self {
        self.config.api.region = region;
        self
    }

    pub fn metadata_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api.metadata_timeout_secs = secs;
        self
    }

    pub fn transfer_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api.transfer_timeout_secs = secs;
        self
    }

    // --- retry ---

    pub fn retry_max_attempts(mut self, n: u32) -> Self {
        self.config.retry.max_attempts = n;
        self
    }

    pub fn retry_base_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry.base_delay_ms = ms;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
