//! Pipeline driver - allocates channels, starts the stages, waits for drain.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinError;

use crate::config::{Config, PipelineConfig};
use crate::error::{GraylineError, Result};
use crate::types::RunSummary;

use super::barrier::CompletionBarrier;
use super::channel::{bounded_channel, rendezvous_channel};
use super::decode::{ImageDecode, ImageDecoder};
use super::fetcher::{Fetcher, HttpFetcher};
use super::registry::ResultRegistry;
use super::stages::{CollectStage, FetchStage, TransformStage};
use super::stats::RunCounters;
use super::store::{FsImageStore, ImageStore};

/// External collaborators the stages delegate to.
#[derive(Clone)]
pub struct Collaborators {
    pub fetcher: Arc<dyn Fetcher>,
    pub decoder: Arc<dyn ImageDecode>,
    /// Receives decoded originals
    pub input_store: Arc<dyn ImageStore>,
    /// Receives grayscale results
    pub output_store: Arc<dyn ImageStore>,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    pub summary: RunSummary,
    pub registry: Arc<ResultRegistry>,
}

/// The fetch → grayscale → collect pipeline.
pub struct Pipeline {
    channels: PipelineConfig,
    decode_timeout_ms: u64,
    collaborators: Collaborators,
}

impl Pipeline {
    /// Create a pipeline with explicit collaborators.
    ///
    /// The configuration is validated first; zero-sized buffers are rejected
    /// here rather than when the channels are allocated.
    pub fn new(config: &Config, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            channels: config.pipeline.clone(),
            decode_timeout_ms: config.limits.decode_timeout_ms,
            collaborators,
        })
    }

    /// Create a pipeline with the HTTP fetcher, `image` decoder, and PNG
    /// stores under the configured directories.
    ///
    /// Fails with `GraylineError::Config` for an invalid configuration and
    /// with `GraylineError::StorageInit` if either directory cannot be
    /// created; nothing is fetched in either case.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let input_store = FsImageStore::open(config.input_dir())?;
        let output_store = FsImageStore::open(config.output_dir())?;
        let collaborators = Collaborators {
            fetcher: Arc::new(HttpFetcher::new(&config.fetch)?),
            decoder: Arc::new(ImageDecoder::new(config.limits.clone())),
            input_store: Arc::new(input_store),
            output_store: Arc::new(output_store),
        };
        Self::new(config, collaborators)
    }

    /// Push every identifier through the pipeline and wait for all stages
    /// to drain.
    ///
    /// On return every identifier that survived fetch and decode has been
    /// converted, registered, and handed to the output store.
    pub async fn run<I, S>(&self, identifiers: I) -> Result<RunReport>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let start = Instant::now();
        let registry = Arc::new(ResultRegistry::new());
        let counters = Arc::new(RunCounters::new());
        let barrier = CompletionBarrier::new();

        let (id_tx, id_rx) = bounded_channel::<String>(self.channels.id_buffer);
        let (fetched_tx, fetched_rx) = bounded_channel(self.channels.fetch_buffer);
        let (gray_tx, gray_rx) = rendezvous_channel();

        let fetch = FetchStage::new(
            Arc::clone(&self.collaborators.fetcher),
            Arc::clone(&self.collaborators.decoder),
            Arc::clone(&self.collaborators.input_store),
            self.decode_timeout_ms,
            Arc::clone(&counters),
        );
        let collect = CollectStage::new(
            Arc::clone(&registry),
            Arc::clone(&self.collaborators.output_store),
            Arc::clone(&counters),
        );

        let stages = [
            (
                "fetch",
                tokio::spawn(fetch.run(id_rx, fetched_tx, barrier.enter())),
            ),
            (
                "transform",
                tokio::spawn(TransformStage::new().run(fetched_rx, gray_tx, barrier.enter())),
            ),
            (
                "collect",
                tokio::spawn(collect.run(gray_rx, barrier.enter())),
            ),
        ];

        let mut submitted = 0usize;
        for id in identifiers {
            if id_tx.send(id.into()).await.is_err() {
                tracing::error!("Fetch stage stopped accepting identifiers");
                break;
            }
            submitted += 1;
        }
        drop(id_tx);
        tracing::debug!("Submitted {} identifier(s)", submitted);

        barrier.wait().await;

        for (stage, handle) in stages {
            if let Err(e) = handle.await {
                return Err(GraylineError::StagePanicked {
                    stage,
                    message: panic_message(e),
                });
            }
        }

        let summary = counters.summarize(submitted, registry.len(), start.elapsed());
        tracing::info!(
            "Processing complete! Processed {} of {} image(s) in {:.1}s",
            summary.processed,
            summary.submitted,
            summary.elapsed_seconds
        );
        Ok(RunReport { summary, registry })
    }
}

fn panic_message(e: JoinError) -> String {
    if !e.is_panic() {
        return e.to_string();
    }
    let payload = e.into_panic();
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
