//! Session configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors from reading or writing a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Settings for one session. Every field is optional in the file.
///
/// ```toml
/// tempo = 128.0
/// master_volume = 0.7
/// inbox_capacity = 512
/// producer_sleep_us = 100
/// log_filter = "nodesynth=debug,info"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Initial tempo in BPM
    pub tempo: f32,
    /// Initial master volume
    pub master_volume: f32,
    /// Live events that can wait between two blocks
    pub inbox_capacity: usize,
    /// Driver sleep while the block ring is full
    pub producer_sleep_us: u64,
    /// `tracing` filter used when `RUST_LOG` is unset
    pub log_filter: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tempo: 120.0,
            master_volume: 0.8,
            inbox_capacity: 256,
            producer_sleep_us: 200,
            log_filter: "info".to_string(),
        }
    }
}

impl SessionConfig {
    /// Load from a TOML file. A missing file gives the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::ReadFile { path: path.into(), source }),
        }
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml()?)
            .map_err(|source| ConfigError::WriteFile { path: path.into(), source })
    }

    pub fn producer_sleep(&self) -> Duration {
        Duration::from_micros(self.producer_sleep_us)
    }
}
