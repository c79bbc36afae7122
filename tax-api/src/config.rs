//! Server configuration.
//!
//! Values come from an optional TOML file; every key is optional and
//! falls back to the defaults below. Command-line flags are applied on top
//! by the binary.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tax_core::db::DbConfig;
use tax_core::models::defaults::DEFAULT_CURRENCY_CODE;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind: String,
    /// Storage backend name, as registered in the repository registry.
    pub backend: String,
    /// Backend connection string. For SQLite a file path or `:memory:`.
    pub db: String,
    /// Currency used when a request does not name one.
    pub default_currency: String,
    /// Log filter directive, e.g. `info` or `tax_api=debug,info`.
    pub log_level: String,
    /// Optional file that receives a copy of all log output.
    pub log_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let db = DbConfig::default();
        Self {
            bind: "127.0.0.1:3000".to_string(),
            backend: db.backend,
            db: db.connection_string,
            default_currency: DEFAULT_CURRENCY_CODE.to_string(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl ServerConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            backend: self.backend.clone(),
            connection_string: self.db.clone(),
        }
    }
}
