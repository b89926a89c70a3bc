//! Collect stage: registers and persists finished images.

use std::sync::Arc;

use super::run_blocking;
use crate::pipeline::barrier::StageToken;
use crate::pipeline::channel::RendezvousReceiver;
use crate::pipeline::registry::ResultRegistry;
use crate::pipeline::stats::RunCounters;
use crate::pipeline::store::{storage_key, ImageStore};
use crate::types::WorkItem;

/// Terminal consumer.
///
/// Several collect stages may share one registry; the registry serializes
/// their inserts.
pub struct CollectStage {
    registry: Arc<ResultRegistry>,
    store: Arc<dyn ImageStore>,
    counters: Arc<RunCounters>,
}

impl CollectStage {
    pub fn new(
        registry: Arc<ResultRegistry>,
        store: Arc<dyn ImageStore>,
        counters: Arc<RunCounters>,
    ) -> Self {
        Self {
            registry,
            store,
            counters,
        }
    }

    /// Register and persist units until the input closes.
    pub async fn run(self, mut input: RendezvousReceiver<WorkItem>, token: StageToken) {
        tracing::debug!("Collect stage started");
        let mut collected = 0usize;

        while let Some(WorkItem { source_id, image }) = input.recv().await {
            tracing::info!("Collecting processed image from {}", source_id);

            let image = Arc::new(image);
            if self
                .registry
                .insert(source_id.clone(), Arc::clone(&image))
                .is_some()
            {
                tracing::debug!("Replaced earlier result for {}", source_id);
            }
            collected += 1;

            let store = Arc::clone(&self.store);
            let key = storage_key(&source_id);
            match run_blocking(move || store.persist(&image, &key)).await {
                Ok(path) => tracing::info!("Saved processed image to {:?}", path),
                Err(e) => {
                    tracing::warn!("Could not save result of {}: {}", source_id, e);
                    self.counters.record_output_persist_failure();
                }
            }
        }

        tracing::debug!("Collect stage finished ({} collected)", collected);
        token.release();
    }
}
