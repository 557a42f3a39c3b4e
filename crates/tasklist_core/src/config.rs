//! Host configuration for the task list core.
//!
//! # Responsibility
//! - Collect the data directory, log level and seed endpoint in one place.
//! - Derive the database and log locations from the data directory.
//!
//! # Invariants
//! - Blank environment values are treated as unset.

use crate::logging::{LogLevel, LoggingError};
use crate::remote::seed_source::DEFAULT_SEED_URL;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "TASKLIST_DATA_DIR";
pub const LOG_LEVEL_ENV: &str = "TASKLIST_LOG_LEVEL";
pub const SEED_URL_ENV: &str = "TASKLIST_SEED_URL";

const DB_FILE_NAME: &str = "tasklist.sqlite3";
const LOG_DIR_NAME: &str = "logs";
const DEFAULT_DATA_DIR_NAME: &str = "tasklist";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub data_dir: PathBuf,
    pub log_level: LogLevel,
    pub seed_url: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            data_dir: std::env::temp_dir().join(DEFAULT_DATA_DIR_NAME),
            log_level: LogLevel::build_default(),
            seed_url: DEFAULT_SEED_URL.to_string(),
        }
    }
}

impl CoreConfig {
    /// Defaults overridden by `TASKLIST_*` environment variables.
    pub fn from_env() -> Result<Self, LoggingError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LoggingError> {
        let value = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
        };

        let mut config = Self::default();
        if let Some(dir) = value(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = value(LOG_LEVEL_ENV) {
            config.log_level = LogLevel::parse(&level)?;
        }
        if let Some(url) = value(SEED_URL_ENV) {
            config.seed_url = url;
        }
        Ok(config)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join(LOG_DIR_NAME)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
