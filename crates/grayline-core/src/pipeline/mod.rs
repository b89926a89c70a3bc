//! Image processing pipeline components.
//!
//! This module contains the collaborators and stages of the pipeline:
//! - **fetcher**: Retrieve raw bytes for an identifier (HTTP by default)
//! - **decode**: Decode bytes into a pixel buffer
//! - **grayscale**: The per-pixel luminance transform
//! - **store**: Persist encoded images and derive storage keys
//! - **registry**: Shared map of finished images
//! - **channel**: Bounded and rendezvous channels between stages
//! - **barrier**: Completion barrier the driver waits on
//! - **stages**: The fetch, transform, and collect workers
//! - **driver**: Wires everything together

pub mod barrier;
pub mod channel;
pub mod decode;
pub mod driver;
pub mod fetcher;
pub mod grayscale;
pub mod registry;
pub mod stages;
pub mod stats;
pub mod store;

// Re-exports for convenient access
pub use barrier::{CompletionBarrier, StageToken};
pub use decode::{ImageDecode, ImageDecoder};
pub use driver::{Collaborators, Pipeline, RunReport};
pub use fetcher::{Fetcher, HttpFetcher};
pub use grayscale::{luma, to_grayscale};
pub use registry::ResultRegistry;
pub use stages::{CollectStage, FetchStage, TransformStage};
pub use stats::RunCounters;
pub use store::{storage_key, FsImageStore, ImageStore};
