//! Configuration loading and resolution
//!
//! Priority order for every server setting:
//! 1. Command-line argument or its environment variable (resolved by clap)
//! 2. TOML config file
//! 3. Compiled default

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SNOTES_CONFIG";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CHANNEL_CAPACITY: usize = 100;
pub const DEFAULT_LOG_FILTER: &str = "snotes_server=info,tower_http=info";

/// Contents of `server.toml`; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
    /// Per-project event buffer before slow subscribers start lagging
    pub channel_capacity: Option<usize>,
    /// Allowed CORS origins; empty means permissive
    #[serde(default)]
    pub cors_origins: Vec<String>,
    pub log_filter: Option<String>,
}

/// Values supplied on the command line (or their env vars)
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
}

/// Fully resolved server settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub channel_capacity: usize,
    pub cors_origins: Vec<String>,
    pub log_filter: String,
}

impl ServerSettings {
    /// Merge overrides, TOML values and compiled defaults
    pub fn resolve(overrides: &Overrides, toml: &TomlConfig) -> Self {
        let channel_capacity = match toml.channel_capacity {
            Some(0) => {
                warn!("channel_capacity = 0 is invalid, using {}", DEFAULT_CHANNEL_CAPACITY);
                DEFAULT_CHANNEL_CAPACITY
            }
            Some(capacity) => capacity,
            None => DEFAULT_CHANNEL_CAPACITY,
        };

        Self {
            host: overrides
                .host
                .clone()
                .or_else(|| toml.host.clone())
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides.port.or(toml.port).unwrap_or(DEFAULT_PORT),
            database_path: overrides
                .database_path
                .clone()
                .or_else(|| toml.database_path.clone())
                .unwrap_or_else(default_database_path),
            channel_capacity,
            cors_origins: toml.cors_origins.clone(),
            log_filter: toml
                .log_filter
                .clone()
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
        }
    }

    /// `host:port` string for binding the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the TOML config with graceful degradation
///
/// Looks at `explicit`, then `SNOTES_CONFIG`, then the platform default path.
/// A missing file yields defaults; an unreadable or invalid file is logged and
/// also yields defaults.
pub fn load_toml_config(explicit: Option<&Path>) -> TomlConfig {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
        .or_else(default_config_path);

    let Some(path) = path else {
        return TomlConfig::default();
    };

    if !path.exists() {
        info!("No config file at {}, using defaults", path.display());
        return TomlConfig::default();
    }

    match read_toml_config(&path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Ignoring config file {}: {}", path.display(), e);
            TomlConfig::default()
        }
    }
}

/// `<config dir>/snotes/server.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("snotes").join("server.toml"))
}

/// `<local data dir>/snotes/snotes.db`
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("snotes"))
        .unwrap_or_else(|| PathBuf::from("./snotes_data"))
        .join("snotes.db")
}
