//! Error types for the Grayline pipeline.
//!
//! Per-item failures (`PipelineError`) are handled at the stage that detects
//! them and never travel through a channel. Only `GraylineError` aborts a run.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Grayline operations.
#[derive(Error, Debug)]
pub enum GraylineError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A storage root could not be created; persistence would fail for every item
    #[error("Failed to initialize storage at {path}: {source}")]
    StorageInit {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A stage task panicked instead of draining its input
    #[error("{stage} stage panicked: {message}")]
    StagePanicked { stage: &'static str, message: String },

    /// HTTP client construction failed
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// The per-item step an operation timed out in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutStage {
    Fetch,
    Decode,
}

impl std::fmt::Display for TimeoutStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeoutStage::Fetch => f.write_str("fetch"),
            TimeoutStage::Decode => f.write_str("decode"),
        }
    }
}

/// Per-item pipeline errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Retrieving the raw bytes failed
    #[error("Fetch failed for {source_id}: {message}")]
    Fetch { source_id: String, message: String },

    /// The body exceeded the configured download limit
    #[error("Download too large: {source_id} (> {max_mb}MB)")]
    DownloadTooLarge { source_id: String, max_mb: u64 },

    /// Image decoding failed
    #[error("Decode error for {source_id}: {message}")]
    Decode { source_id: String, message: String },

    /// Image dimensions exceed limit
    #[error("Image too large: {source_id} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        source_id: String,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {source_id} after {timeout_ms}ms")]
    Timeout {
        source_id: String,
        stage: TimeoutStage,
        timeout_ms: u64,
    },

    /// Writing an encoded image to storage failed
    #[error("Persist failed for {path}: {message}")]
    Persist { path: PathBuf, message: String },
}

impl PipelineError {
    /// Whether this error happened before a unit of work existed.
    ///
    /// Fetch-side failures are counted separately from decode-side ones in
    /// the run summary.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            PipelineError::Fetch { .. }
                | PipelineError::DownloadTooLarge { .. }
                | PipelineError::Timeout {
                    stage: TimeoutStage::Fetch,
                    ..
                }
        )
    }
}

/// Convenience type alias for Grayline results.
pub type Result<T> = std::result::Result<T, GraylineError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
