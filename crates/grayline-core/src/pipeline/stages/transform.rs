//! Transform stage: replaces each unit's pixels with their grayscale mapping.

use tokio::sync::mpsc;

use super::run_blocking;
use crate::pipeline::barrier::StageToken;
use crate::pipeline::channel::RendezvousSender;
use crate::pipeline::grayscale::to_grayscale;
use crate::types::WorkItem;

/// Pure middle stage. Never drops an item.
#[derive(Debug, Default)]
pub struct TransformStage;

impl TransformStage {
    pub fn new() -> Self {
        Self
    }

    /// Convert units until the input closes.
    ///
    /// The whole buffer is converted before the unit is handed on, and the
    /// hand-off waits for the collect stage to take it.
    pub async fn run(
        self,
        mut input: mpsc::Receiver<WorkItem>,
        output: RendezvousSender<WorkItem>,
        token: StageToken,
    ) {
        tracing::debug!("Transform stage started");
        let mut converted = 0usize;

        while let Some(item) = input.recv().await {
            tracing::info!("Processing image from {}", item.source_id);

            let item = run_blocking(move || WorkItem {
                image: to_grayscale(item.image),
                source_id: item.source_id,
            })
            .await;

            if output.send(item).await.is_err() {
                tracing::warn!("Collect stage is gone; transform stage stopping early");
                break;
            }
            converted += 1;
        }

        drop(output);
        tracing::debug!("Transform stage finished ({} converted)", converted);
        token.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::barrier::CompletionBarrier;
    use crate::pipeline::channel::{bounded_channel, rendezvous_channel};
    use crate::pipeline::grayscale::luma;
    use image::{DynamicImage, Rgb, RgbImage};

    #[tokio::test]
    async fn test_converts_and_forwards_every_item() {
        let barrier = CompletionBarrier::new();
        let (in_tx, in_rx) = bounded_channel(4);
        let (out_tx, mut out_rx) = rendezvous_channel();

        let handle = tokio::spawn(TransformStage::new().run(in_rx, out_tx, barrier.enter()));

        for (id, color) in [("red", [255, 0, 0]), ("teal", [0, 128, 128])] {
            let rgb = RgbImage::from_pixel(3, 2, Rgb(color));
            in_tx
                .send(WorkItem::new(id, DynamicImage::ImageRgb8(rgb)))
                .await
                .unwrap();
        }
        drop(in_tx);

        let red = out_rx.recv().await.unwrap();
        assert_eq!(red.source_id, "red");
        let red = red.image.as_luma8().unwrap();
        assert_eq!(red.dimensions(), (3, 2));
        assert!(red.pixels().all(|p| p.0[0] == luma(255, 0, 0)));

        let teal = out_rx.recv().await.unwrap();
        assert_eq!(teal.source_id, "teal");
        assert!(teal
            .image
            .as_luma8()
            .unwrap()
            .pixels()
            .all(|p| p.0[0] == luma(0, 128, 128)));

        assert!(out_rx.recv().await.is_none());
        barrier.wait().await;
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_input_closes_output() {
        let barrier = CompletionBarrier::new();
        let (in_tx, in_rx) = bounded_channel::<WorkItem>(1);
        let (out_tx, mut out_rx) = rendezvous_channel();

        let handle = tokio::spawn(TransformStage::new().run(in_rx, out_tx, barrier.enter()));
        drop(in_tx);

        assert!(out_rx.recv().await.is_none());
        barrier.wait().await;
        handle.await.unwrap();
    }
}
