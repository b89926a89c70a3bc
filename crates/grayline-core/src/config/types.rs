//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Channel capacities between pipeline stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Identifiers buffered between the driver and the fetch stage
    pub id_buffer: usize,

    /// Decoded images the fetch stage may run ahead of the transform stage
    pub fetch_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            id_buffer: 1,
            fetch_buffer: 10,
        }
    }
}

/// HTTP fetch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in milliseconds (connect + body)
    pub timeout_ms: u64,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Maximum response body size in megabytes
    pub max_download_mb: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            user_agent: format!("grayline/{}", env!("CARGO_PKG_VERSION")),
            max_download_mb: 50,
        }
    }
}

impl FetchConfig {
    /// Body size limit in bytes, saturating at `u64::MAX`.
    pub fn max_download_bytes(&self) -> u64 {
        self.max_download_mb.saturating_mul(1024 * 1024)
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_dimension: 10000,
            decode_timeout_ms: 5000,
        }
    }
}

/// Where original and grayscale images are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory for decoded originals
    pub input_dir: PathBuf,

    /// Directory for grayscale results
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
