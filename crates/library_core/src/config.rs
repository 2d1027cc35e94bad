//! Runtime configuration for hosts embedding the library core.
//!
//! # Responsibility
//! - Resolve store location and logging settings from the environment.
//! - Validate settings once, before any store or logger is created.
//!
//! # Invariants
//! - A `LogConfig` always carries a supported level and an absolute directory.
//! - No `db_path` means a private in-memory store.

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, normalize_level};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DB_PATH_ENV: &str = "LIBRARY_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "LIBRARY_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "LIBRARY_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnsupportedLogLevel(String),
    EmptyLogDir,
    RelativeLogDir(PathBuf),
    /// `LIBRARY_LOG_LEVEL` was set without a directory to log into.
    LogLevelWithoutDir,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLogLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::EmptyLogDir => write!(f, "log directory cannot be empty"),
            Self::RelativeLogDir(path) => write!(
                f,
                "log directory must be an absolute path, got `{}`",
                path.display()
            ),
            Self::LogLevelWithoutDir => {
                write!(f, "{LOG_LEVEL_ENV} is set but {LOG_DIR_ENV} is not")
            }
        }
    }
}

impl Error for ConfigError {}

/// Validated logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    level: &'static str,
    dir: PathBuf,
}

impl LogConfig {
    pub fn new(level: &str, dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let level = normalize_level(level)
            .ok_or_else(|| ConfigError::UnsupportedLogLevel(level.trim().to_string()))?;
        let dir = dir.into();
        if dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyLogDir);
        }
        if !dir.is_absolute() {
            return Err(ConfigError::RelativeLogDir(dir));
        }
        Ok(Self { level, dir })
    }

    pub fn level(&self) -> &'static str {
        self.level
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Store and logging settings for one process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryConfig {
    pub db_path: Option<PathBuf>,
    pub log: Option<LogConfig>,
}

impl LibraryConfig {
    /// Reads `LIBRARY_DB_PATH`, `LIBRARY_LOG_LEVEL` and `LIBRARY_LOG_DIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves settings through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let db_path = read(DB_PATH_ENV).map(PathBuf::from);
        let log = match (read(LOG_LEVEL_ENV), read(LOG_DIR_ENV)) {
            (level, Some(dir)) => Some(LogConfig::new(
                level.as_deref().unwrap_or(default_log_level()),
                dir,
            )?),
            (Some(_), None) => return Err(ConfigError::LogLevelWithoutDir),
            (None, None) => None,
        };

        Ok(Self { db_path, log })
    }

    /// Opens the configured store with the full schema applied.
    pub fn open_store(&self) -> DbResult<Connection> {
        match &self.db_path {
            Some(path) => open_db(path),
            None => open_db_in_memory(),
        }
    }
}
