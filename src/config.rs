//! Configuration for tripfolio.
//!
//! Loaded from a TOML file (`--config PATH`, or `tripfolio.toml` in the
//! platform config directory when present), then overridden by environment
//! variables. Every key has a default, so an empty or missing file works.
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [storage]
//! root = "data/blobs"
//! bucket = "photos"
//! public_base_url = "http://localhost:8080/media"
//!
//! [database]
//! path = "data/tripfolio.db"
//!
//! [exif]
//! coordinate_format = "decimal"   # or "dms"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::metadata::CoordinateFormat;

pub const CONFIG_FILENAME: &str = "tripfolio.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Largest accepted upload body
    pub max_upload_mb: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            max_upload_mb: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub bucket: String,
    /// Differs per deployment: a local emulator, the built-in media route, or a CDN
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/blobs"),
            bucket: "photos".to_string(),
            public_base_url: "http://localhost:8080/media".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/tripfolio.db"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExifConfig {
    pub coordinate_format: CoordinateFormat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub exif: ExifConfig,
}

impl Config {
    /// Load from `path`, or the default location, then apply env overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded config file");
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// `TRIPFOLIO_*` variables win over file values
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("TRIPFOLIO_PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "TRIPFOLIO_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(root) = lookup("TRIPFOLIO_STORAGE_ROOT") {
            self.storage.root = PathBuf::from(root);
        }
        if let Some(base) = lookup("TRIPFOLIO_PUBLIC_BASE_URL") {
            self.storage.public_base_url = base;
        }
        if let Some(db) = lookup("TRIPFOLIO_DATABASE") {
            self.database.path = PathBuf::from(db);
        }
        if let Some(format) = lookup("TRIPFOLIO_COORDINATE_FORMAT") {
            self.exif.coordinate_format =
                format.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "TRIPFOLIO_COORDINATE_FORMAT",
                    value: format.clone(),
                })?;
        }
        Ok(())
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

/// `tripfolio.toml` in the platform config directory
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "tripfolio")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}
