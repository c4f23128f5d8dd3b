use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tubegrab_engine::ServiceSettings;

use super::logging::LogDestination;

const DEFAULT_CONFIG_FILE: &str = "tubegrab.ron";
const CONFIG_ENV: &str = "TUBEGRAB_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Client settings loaded from `tubegrab.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service_url: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// Consecutive failed polls before a job is given up; `None` polls forever.
    pub poll_failure_limit: Option<u32>,
    pub log_destination: LogDestination,
    pub log_level: String,
    pub history_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        let service = ServiceSettings::default();
        Self {
            service_url: service.base_url,
            poll_interval_ms: service.poll_interval.as_millis() as u64,
            connect_timeout_ms: service.connect_timeout.as_millis() as u64,
            request_timeout_ms: service.request_timeout.as_millis() as u64,
            poll_failure_limit: None,
            log_destination: LogDestination::File,
            log_level: "info".to_string(),
            history_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            base_url: self.service_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms.max(1)),
            request_timeout: Duration::from_millis(self.request_timeout_ms.max(1)),
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
        }
    }

    /// Parsed log level; unknown names fall back to `Info`.
    pub fn level_filter(&self) -> LevelFilter {
        LevelFilter::from_str(self.log_level.trim()).unwrap_or(LevelFilter::Info)
    }
}

/// Loads the config named by `TUBEGRAB_CONFIG`, or `./tubegrab.ron`.
///
/// Falls back to defaults on any error and hands the error back so it can be
/// logged once logging is up.
pub fn load_from_env() -> (AppConfig, Option<ConfigError>) {
    let path = std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    match load(&path) {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    }
}

pub fn load(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(AppConfig::default());
        }
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.to_string(),
    })
}
