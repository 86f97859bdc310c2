//! Configuration management.

mod file_config;

pub use file_config::{ApiSection, ConfigFile, ConfigFileError, LoggingConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::client::DEFAULT_BASE_URL;

/// Name of the configuration file looked up by [`find_config_file`]
pub const CONFIG_FILE_NAME: &str = "worldcat.toml";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Service access settings
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// WorldCat service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API key (`wskey`)
    #[serde(default = "default_api_key")]
    pub key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            key: default_api_key(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_api_key() -> Option<String> {
    std::env::var("WORLDCAT_API_KEY").ok()
}

fn default_base_url() -> String {
    std::env::var("WORLDCAT_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}

fn default_timeout() -> u64 {
    30
}

/// Load configuration from a file, with `WORLDCAT_*` environment overrides
/// (`WORLDCAT_API__KEY`, `WORLDCAT_API__TIMEOUT_SECS`, ...)
pub fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix("WORLDCAT")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}

/// Get the default configuration (from env vars or defaults)
pub fn get_config() -> Config {
    Config::default()
}

/// Per-user config file location, `<config dir>/worldcat/worldcat.toml`
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("worldcat").join(CONFIG_FILE_NAME))
}

/// Find a config file: `./worldcat.toml`, then the per-user file
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    user_config_path().filter(|path| path.is_file())
}
