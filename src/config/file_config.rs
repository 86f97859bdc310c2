//! Configuration file support.
//!
//! # Configuration File Format
//!
//! ```toml
//! [api]
//! key = "your-wskey"
//! base_url = "http://www.worldcat.org/webservices/catalog/"
//! timeout_secs = 30
//!
//! [logging]
//! level = "warn"
//! format = "json"   # optional; plain text when absent
//! ```
//!
//! `worldcat init` writes a starter file with [`ConfigFile::starter`].

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration file structure
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[api]` section; every key is optional in the file
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ApiSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl ConfigFile {
    /// Starter file with the service defaults filled in
    pub fn starter(key: Option<String>) -> Self {
        Self {
            api: ApiSection {
                key,
                base_url: Some(crate::client::DEFAULT_BASE_URL.to_string()),
                timeout_secs: Some(30),
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
    }

    /// Save configuration to a TOML file, creating missing parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigFileError::Io(e.to_string()))?;
        }

        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_config_file_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("worldcat.toml");

        let toml_content = r#"
[api]
key = "test-key"
timeout_secs = 10

[logging]
level = "debug"
format = "json"
"#;

        let mut file = File::create(&path).unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = ConfigFile::load(&path).unwrap();

        assert_eq!(config.api.key, Some("test-key".to_string()));
        assert_eq!(config.api.base_url, None);
        assert_eq!(config.api.timeout_secs, Some(10));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_config_file_save_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("worldcat.toml");

        let mut config = ConfigFile::default();
        config.api.key = Some("saved-key".to_string());
        config.logging.level = "trace".to_string();

        config.save(&path).unwrap();

        let loaded = ConfigFile::load(&path).unwrap();
        assert_eq!(loaded.api.key, Some("saved-key".to_string()));
        assert_eq!(loaded.logging.level, "trace");
    }

    #[test]
    fn test_config_file_empty_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.toml");
        std::fs::write(&path, "").unwrap();

        let config = ConfigFile::load(&path).unwrap();
        assert!(config.api.key.is_none());
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_starter_file_is_loadable_by_config_layer() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("worldcat.toml");

        ConfigFile::starter(Some("starter-key".to_string()))
            .save(&path)
            .unwrap();

        let config = crate::config::load_config(&path).unwrap();
        assert_eq!(config.api.key.as_deref(), Some("starter-key"));
        assert_eq!(config.api.base_url, crate::client::DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.logging.level, "warn");
        assert!(config.logging.format.is_none());
    }

    #[test]
    fn test_config_file_nonexistent() {
        let path = PathBuf::from("/nonexistent/worldcat.toml");
        assert!(matches!(
            ConfigFile::load(&path),
            Err(ConfigFileError::Io(_))
        ));
    }

    #[test]
    fn test_config_file_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");

        std::fs::write(&path, "invalid = toml = content").unwrap();

        assert!(matches!(
            ConfigFile::load(&path),
            Err(ConfigFileError::Parse(_))
        ));
    }
}
