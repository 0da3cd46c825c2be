// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration file loading.
//!
//! Values come from `$XDG_CONFIG_HOME/walscan/config.toml` (or the platform
//! config dir) unless `--config` names another file. Command-line flags
//! override whatever the file sets.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use ws_adapters::BackendConfig;
use ws_engine::{ScannerConfig, DEFAULT_READ_AHEAD_BUFFER_SIZE};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Settings of the file backend
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FileSection {
    /// How often a tailing read looks for appended lines
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,
}

impl Default for FileSection {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub backend: String,
    pub data_dir: Option<PathBuf>,
    pub read_ahead_buffer_size: i64,
    pub log_level: String,
    pub file: FileSection,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
            data_dir: None,
            read_ahead_buffer_size: DEFAULT_READ_AHEAD_BUFFER_SIZE,
            log_level: "warn".to_string(),
            file: FileSection::default(),
        }
    }
}

impl Config {
    /// Load the config.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => match default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.trim().is_empty() {
            return Err(ConfigError::Invalid("backend must not be empty".to_string()));
        }
        if self.file.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "file.poll_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig {
            address: None,
            data_dir: self.data_dir.clone(),
            poll_interval: self.file.poll_interval,
        }
    }

    /// Scanner tuning; negative read-ahead sizes are clamped by the scanner
    pub fn scanner_config(&self) -> ScannerConfig {
        ScannerConfig {
            read_ahead_buffer_size: self.read_ahead_buffer_size,
            ..ScannerConfig::default()
        }
    }
}

/// Default config location
pub fn default_path() -> Option<PathBuf> {
    let base = match std::env::var_os("XDG_CONFIG_HOME") {
        Some(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => dirs::config_dir()?,
    };
    Some(base.join("walscan").join("config.toml"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
