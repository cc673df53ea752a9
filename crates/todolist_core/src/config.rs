//! Core runtime configuration.
//!
//! # Responsibility
//! - Resolve database path and logging settings from the environment.
//!
//! # Invariants
//! - Missing variables fall back to defaults; present-but-blank values are
//!   rejected instead of silently ignored.

use crate::logging::default_log_level;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Database file name used when no path is configured.
pub const DEFAULT_DB_FILE_NAME: &str = "task_database";

pub const DB_PATH_ENV: &str = "TODOLIST_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "TODOLIST_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "TODOLIST_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable is set but empty after trim.
    Blank(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blank(key) => write!(f, "environment variable `{key}` is set but blank"),
        }
    }
}

impl Error for ConfigError {}

/// Settings needed to bring up the task runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    /// File logging is disabled when `None`.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, which maps a key to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &'static str| -> Result<Option<String>, ConfigError> {
            match lookup(key) {
                None => Ok(None),
                Some(value) if value.trim().is_empty() => Err(ConfigError::Blank(key)),
                Some(value) => Ok(Some(value.trim().to_string())),
            }
        };

        let mut config = Self::default();
        if let Some(path) = read(DB_PATH_ENV)? {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(LOG_LEVEL_ENV)? {
            config.log_level = level;
        }
        config.log_dir = read(LOG_DIR_ENV)?.map(PathBuf::from);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, DB_PATH_ENV, DEFAULT_DB_FILE_NAME, LOG_DIR_ENV};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = CoreConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_FILE_NAME));
        assert!(config.log_dir.is_none());
        assert!(!config.log_level.is_empty());
    }

    #[test]
    fn values_are_trimmed() {
        let config = CoreConfig::from_lookup(lookup(&[
            (DB_PATH_ENV, " /tmp/tasks.db "),
            (LOG_DIR_ENV, "/tmp/logs"),
        ]))
        .unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/tasks.db"));
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/logs")));
    }

    #[test]
    fn blank_values_are_rejected() {
        let err = CoreConfig::from_lookup(lookup(&[(DB_PATH_ENV, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Blank(DB_PATH_ENV));
    }
}
