//! Configuration file handling
//!
//! A single JSON document. Every field has a default, so `{}` is a valid
//! configuration.

use std::fs;
use std::path::{Path, PathBuf};

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_server::HttpServerConfig;

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid config JSON: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding persisted datasets (default: "./data")
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default)]
    pub geocoder: GeocoderConfig,

    #[serde(default)]
    pub http: HttpServerConfig,
}

/// Address lookup service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Lookup prefix; the address is appended as one path segment
    #[serde(default = "default_geocoder_url")]
    pub base_url: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_geocoder_url() -> String {
    "http://cs310.students.cs.ubc.ca:11316/api/v1/project_team203".to_string()
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_url(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            geocoder: GeocoderConfig::default(),
            http: HttpServerConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: Config =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Loads the file if it exists, otherwise the defaults
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            let config = Config::default();
            config.validate()?;
            Ok(config)
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }

        let url = Url::parse(&self.geocoder.base_url).map_err(|e| {
            ConfigError::Invalid(format!(
                "geocoder.base_url '{}': {}",
                self.geocoder.base_url, e
            ))
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::Invalid(format!(
                "geocoder.base_url '{}' cannot take a path",
                self.geocoder.base_url
            )));
        }

        if self.http.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("http.max_body_bytes must be > 0".into()));
        }
        Ok(())
    }
}
