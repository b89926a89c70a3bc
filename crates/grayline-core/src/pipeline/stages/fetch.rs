//! Fetch stage: identifier in, decoded unit of work out.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use super::run_blocking;
use crate::error::{PipelineError, PipelineResult, TimeoutStage};
use crate::pipeline::barrier::StageToken;
use crate::pipeline::decode::ImageDecode;
use crate::pipeline::fetcher::Fetcher;
use crate::pipeline::stats::RunCounters;
use crate::pipeline::store::{storage_key, ImageStore};
use crate::types::WorkItem;

/// Leaf producer: fetches, decodes, saves the original, and forwards.
pub struct FetchStage {
    fetcher: Arc<dyn Fetcher>,
    decoder: Arc<dyn ImageDecode>,
    store: Arc<dyn ImageStore>,
    decode_timeout_ms: u64,
    counters: Arc<RunCounters>,
}

impl FetchStage {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        decoder: Arc<dyn ImageDecode>,
        store: Arc<dyn ImageStore>,
        decode_timeout_ms: u64,
        counters: Arc<RunCounters>,
    ) -> Self {
        Self {
            fetcher,
            decoder,
            store,
            decode_timeout_ms,
            counters,
        }
    }

    /// Consume identifiers until the channel closes.
    ///
    /// A failed fetch or decode skips that identifier only. Sending on
    /// `output` waits while the bounded channel is full.
    pub async fn run(
        self,
        mut identifiers: mpsc::Receiver<String>,
        output: mpsc::Sender<WorkItem>,
        token: StageToken,
    ) {
        tracing::debug!("Fetch stage started");
        let mut forwarded = 0usize;

        while let Some(source_id) = identifiers.recv().await {
            tracing::info!("Downloading {}", source_id);

            let item = match self.acquire(&source_id).await {
                Ok(item) => item,
                Err(e) => {
                    tracing::error!("Skipping {}: {}", source_id, e);
                    self.counters.record_dropped(&e);
                    continue;
                }
            };

            let item = self.persist_original(item).await;

            if output.send(item).await.is_err() {
                tracing::warn!("Transform stage is gone; fetch stage stopping early");
                break;
            }
            forwarded += 1;
        }

        drop(output);
        tracing::debug!("Fetch stage finished ({} forwarded)", forwarded);
        token.release();
    }

    /// Fetch and decode one identifier.
    async fn acquire(&self, source_id: &str) -> PipelineResult<WorkItem> {
        let bytes = self.fetcher.fetch(source_id).await?;

        let decoder = Arc::clone(&self.decoder);
        let id = source_id.to_string();
        // A timed-out decode keeps its blocking thread and buffer until it
        // finishes; only the result is discarded.
        let decoded = timeout(
            Duration::from_millis(self.decode_timeout_ms),
            run_blocking(move || decoder.decode(&bytes, &id)),
        )
        .await
        .map_err(|_| PipelineError::Timeout {
            source_id: source_id.to_string(),
            stage: TimeoutStage::Decode,
            timeout_ms: self.decode_timeout_ms,
        })??;

        Ok(WorkItem::new(source_id, decoded))
    }

    /// Best-effort save of the decoded original; the item is forwarded either way.
    async fn persist_original(&self, item: WorkItem) -> WorkItem {
        let store = Arc::clone(&self.store);
        let key = storage_key(&item.source_id);
        let (item, result) = run_blocking(move || {
            let result = store.persist(&item.image, &key);
            (item, result)
        })
        .await;

        match result {
            Ok(path) => tracing::debug!("Saved original of {} to {:?}", item.source_id, path),
            Err(e) => {
                tracing::warn!("Could not save original of {}: {}", item.source_id, e);
                self.counters.record_input_persist_failure();
            }
        }
        item
    }
}
