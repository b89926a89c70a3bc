//! Grayline Core - fetch remote images, convert them to grayscale, keep both.
//!
//! # Architecture
//!
//! Three long-lived stages connected by channels:
//!
//! ```text
//! identifiers ─▶ Fetch (fetch, decode, save original)
//!             ─[bounded]─▶ Transform (grayscale)
//!             ─[rendezvous]─▶ Collect (register, save result)
//! ```
//!
//! The fetch → transform channel is bounded so fetching can run ahead of
//! conversion by a fixed number of images. The transform → collect channel
//! has no buffer at all. Per-item failures are logged and skipped; they never
//! stop the run.
//!
//! # Usage
//!
//! ```rust,ignore
//! use grayline_core::{Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> grayline_core::Result<()> {
//!     let config = Config::load()?;
//!     let pipeline = Pipeline::from_config(&config)?;
//!
//!     let report = pipeline.run(["https://example.com/cat.jpg"]).await?;
//!     println!("Processed {} image(s)", report.summary.processed);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{
    ConfigError, GraylineError, PipelineError, PipelineResult, Result, TimeoutStage,
};
pub use pipeline::{
    storage_key, Collaborators, Fetcher, FsImageStore, HttpFetcher, ImageDecode, ImageDecoder,
    ImageStore, Pipeline, ResultRegistry, RunReport,
};
pub use types::{RunSummary, WorkItem};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
