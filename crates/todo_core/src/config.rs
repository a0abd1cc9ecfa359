//! Core runtime configuration.
//!
//! # Responsibility
//! - Describe where the todo store lives and how the core logs.
//! - Resolve overrides from process environment variables.
//!
//! # Invariants
//! - Blank environment values are ignored, never treated as overrides.

use crate::logging::default_log_level;
use crate::repo::todo_repo::TodoOrdering;
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_DB_PATH: &str = "TODO_DB_PATH";
pub const ENV_ORDERING: &str = "TODO_ORDERING";
pub const ENV_LOG_LEVEL: &str = "TODO_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "TODO_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "todo_core.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown ordering `{0}`; expected newest_first|completion_then_due")]
    UnknownOrdering(String),
}

/// Settings consumed by `bootstrap`.
///
/// The default `db_path` lives in the system temp directory, which the OS
/// may wipe. Hosts set it to their application storage directory, either
/// directly or through `TODO_DB_PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    pub ordering: TodoOrdering,
    pub log_level: String,
    /// Absolute directory for rolling log files. `None` leaves logging to
    /// whatever the host process configured.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            ordering: TodoOrdering::default(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Defaults overlaid with `TODO_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values returned by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let mut config = Self::default();
        if let Some(path) = value(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(raw) = value(ENV_ORDERING) {
            config.ordering =
                TodoOrdering::parse(&raw).ok_or(ConfigError::UnknownOrdering(raw))?;
        }
        if let Some(level) = value(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        if let Some(dir) = value(ENV_LOG_DIR) {
            config.log_dir = Some(PathBuf::from(dir));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, ENV_DB_PATH, ENV_LOG_DIR, ENV_ORDERING};
    use crate::repo::todo_repo::TodoOrdering;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = CoreConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.ordering, TodoOrdering::NewestFirst);
        assert!(config.log_dir.is_none());
        assert!(config.db_path.starts_with(std::env::temp_dir()));
    }

    #[test]
    fn overrides_are_applied_and_blank_values_ignored() {
        let config = CoreConfig::from_lookup(lookup_from(&[
            (ENV_DB_PATH, " /data/todos.sqlite3 "),
            (ENV_ORDERING, "completion_then_due"),
            (ENV_LOG_DIR, "   "),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/data/todos.sqlite3"));
        assert_eq!(config.ordering, TodoOrdering::CompletionThenDue);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn unknown_ordering_is_rejected() {
        let err = CoreConfig::from_lookup(lookup_from(&[(ENV_ORDERING, "alphabetical")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownOrdering("alphabetical".to_string()));
    }
}
