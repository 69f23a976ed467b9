//! Service configuration loaded from TOML.
//!
//! # Responsibility
//! - Describe database pool/pragma settings and logging settings.
//! - Fill every omitted key with a default so an empty file is valid.
//!
//! # Invariants
//! - `validate()` must pass before a pool is opened from this config.

use crate::logging::{default_log_level, normalize_level};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const MAX_POOL_CONNECTIONS: u32 = 64;

/// Top-level configuration file shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    #[serde(default)]
    pub database: DbConfig,
    #[serde(default)]
    pub logging: LogConfig,
}

/// `PRAGMA synchronous` level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynchronousMode {
    Off,
    /// Safe from corruption under WAL; the last commits may roll back after
    /// power loss.
    #[default]
    Normal,
    Full,
    Extra,
}

impl SynchronousMode {
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Normal => "NORMAL",
            Self::Full => "FULL",
            Self::Extra => "EXTRA",
        }
    }
}

/// Database file, pool sizing and connection pragmas.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DbConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_idle")]
    pub min_idle: u32,
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,
    /// How long a caller waits to check out a pooled connection.
    #[serde(default = "default_connection_timeout_secs")]
    pub connection_timeout_secs: u64,
    /// How long a blocked writer waits on the database lock.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default)]
    pub synchronous: SynchronousMode,
    #[serde(default = "default_cache_size_kib")]
    pub cache_size_kib: i64,
    #[serde(default = "default_mmap_size")]
    pub mmap_size: i64,
    /// In pages.
    #[serde(default = "default_wal_autocheckpoint")]
    pub wal_autocheckpoint: i64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
            min_idle: default_min_idle(),
            max_lifetime_secs: default_max_lifetime_secs(),
            connection_timeout_secs: default_connection_timeout_secs(),
            busy_timeout_ms: default_busy_timeout_ms(),
            synchronous: SynchronousMode::default(),
            cache_size_kib: default_cache_size_kib(),
            mmap_size: default_mmap_size(),
            wal_autocheckpoint: default_wal_autocheckpoint(),
        }
    }
}

impl DbConfig {
    /// Default settings for the database file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.path.as_os_str().is_empty() {
            return Err("database.path cannot be empty".to_string());
        }
        if self.max_connections == 0 || self.max_connections > MAX_POOL_CONNECTIONS {
            return Err(format!(
                "database.max_connections must be between 1 and {MAX_POOL_CONNECTIONS}, got {}",
                self.max_connections
            ));
        }
        if self.min_idle > self.max_connections {
            return Err(format!(
                "database.min_idle ({}) cannot exceed database.max_connections ({})",
                self.min_idle, self.max_connections
            ));
        }
        if self.busy_timeout_ms == 0 {
            return Err("database.busy_timeout_ms must be positive".to_string());
        }
        if self.connection_timeout_secs == 0 {
            return Err("database.connection_timeout_secs must be positive".to_string());
        }
        Ok(())
    }
}

/// Logger settings. Logging stays uninitialized when `dir` is absent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Absolute directory for rolling log files.
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
        }
    }
}

impl ServiceConfig {
    /// Reads and validates a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate().map_err(ConfigError::Invalid)?;

        normalize_level(&self.logging.level).map_err(ConfigError::Invalid)?;
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./dmail.db")
}

fn default_max_connections() -> u32 {
    16
}

fn default_min_idle() -> u32 {
    4
}

fn default_max_lifetime_secs() -> u64 {
    300
}

fn default_connection_timeout_secs() -> u64 {
    30
}

fn default_busy_timeout_ms() -> u64 {
    40_000
}

fn default_cache_size_kib() -> i64 {
    200_001
}

fn default_mmap_size() -> i64 {
    256 * 1024 * 1024
}

fn default_wal_autocheckpoint() -> i64 {
    4000
}

fn default_level() -> String {
    default_log_level().to_string()
}
