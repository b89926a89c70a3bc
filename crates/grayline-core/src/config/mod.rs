//! Configuration management for Grayline.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Every section implements `Default`, so a partial file is fine.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Grayline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Channel capacities
    pub pipeline: PipelineConfig,

    /// HTTP fetch settings
    pub fetch: FetchConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Storage locations
    pub storage: StorageConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.grayline.grayline/config.toml
    /// - Linux: ~/.config/grayline/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\grayline\config\config.toml
    ///
    /// Falls back to ~/.grayline/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "grayline", "grayline")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".grayline").join("config.toml")
            })
    }

    /// Resolved directory for decoded originals (with ~ expansion).
    pub fn input_dir(&self) -> PathBuf {
        expand(&self.storage.input_dir)
    }

    /// Resolved directory for grayscale results (with ~ expansion).
    pub fn output_dir(&self) -> PathBuf {
        expand(&self.storage.output_dir)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    let expanded = shellexpand::tilde(&path_str);
    PathBuf::from(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pipeline.id_buffer, 1);
        assert_eq!(config.pipeline.fetch_buffer, 10);
        assert_eq!(config.storage.input_dir, PathBuf::from("input"));
        assert_eq!(config.storage.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_config_to_toml() {
        let config = Config::default();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[pipeline]"));
        assert!(toml.contains("[storage]"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml("[pipeline]\nfetch_buffer = 3\n").unwrap();
        assert_eq!(config.pipeline.fetch_buffer, 3);
        assert_eq!(config.pipeline.id_buffer, 1);
        assert_eq!(config.limits.max_image_dimension, 10000);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let err = Config::from_toml("[pipeline]\nfetch_buffer = 0\n").unwrap_err();
        assert!(err.to_string().contains("fetch_buffer"));
    }

    #[test]
    fn test_tilde_expansion() {
        let mut config = Config::default();
        config.storage.output_dir = PathBuf::from("~/gray");
        assert!(!config.output_dir().to_string_lossy().starts_with('~'));
    }

    #[test]
    fn test_max_download_bytes() {
        let fetch = FetchConfig {
            max_download_mb: 2,
            ..FetchConfig::default()
        };
        assert_eq!(fetch.max_download_bytes(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_huge_max_download_saturates() {
        let toml = format!("[fetch]\nmax_download_mb = {}\n", i64::MAX);
        let config = Config::from_toml(&toml).unwrap();
        assert_eq!(config.fetch.max_download_bytes(), u64::MAX);
    }
}
