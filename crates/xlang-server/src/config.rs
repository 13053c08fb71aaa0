//! Configuration resolution
//!
//! Precedence, highest first: command line / environment, the TOML file
//! named by `--config`, built-in defaults.
//!
//! ```toml
//! host = "127.0.0.1"
//! port = 23456
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use xlang_grpc::ServerConfig;

use crate::cli::Cli;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Settings accepted in the TOML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Listen address
    pub host: Option<String>,

    /// Listen port
    pub port: Option<u16>,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }
}

/// Merge command line, file and defaults into the server configuration
pub fn resolve(cli: &Cli) -> Result<ServerConfig, ConfigError> {
    let file = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let defaults = ServerConfig::default();

    Ok(ServerConfig {
        addr: cli.host.clone().or(file.host).unwrap_or(defaults.addr),
        port: cli.port.or(file.port).unwrap_or(defaults.port),
    })
}
