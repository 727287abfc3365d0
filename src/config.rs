//! Runtime configuration.
//!
//! Settings come from the environment; the command line may override them.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use log::LevelFilter;

use crate::storage::store::DEFAULT_STORE_FILE;

pub const STORE_PATH_ENV: &str = "TELEMETRY_STORE_PATH";
pub const LOG_LEVEL_ENV: &str = "TELEMETRY_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    /// JSON file holding the accumulated records.
    pub store_path: PathBuf,
    pub log_level: LevelFilter,
    /// Unparsable `TELEMETRY_LOG_LEVEL` value, kept until a logger exists.
    pub rejected_log_level: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_STORE_FILE),
            log_level: LevelFilter::Info,
            rejected_log_level: None,
        }
    }
}

impl DashboardConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unset or empty values keep
    /// the defaults; an unparsable log level is ignored and remembered for
    /// [`DashboardConfig::warn_rejected`].
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(STORE_PATH_ENV).filter(|p| !p.is_empty()) {
            config.store_path = PathBuf::from(path);
        }

        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|l| !l.is_empty()) {
            match LevelFilter::from_str(&level) {
                Ok(parsed) => config.log_level = parsed,
                Err(_) => config.rejected_log_level = Some(level),
            }
        }

        config
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    /// Log settings that were read but ignored. Call once the logger is
    /// installed.
    pub fn warn_rejected(&self) {
        if let Some(level) = &self.rejected_log_level {
            log::warn!(
                "CONFIG_INVALID key={} value={:?} using={}",
                LOG_LEVEL_ENV,
                level,
                self.log_level
            );
        }
    }
}
