//! Image decoding with format detection and dimension limits.

use image::{DynamicImage, GenericImageView};
use std::io::Cursor;

use crate::config::LimitsConfig;
use crate::error::{PipelineError, PipelineResult};

/// Turns raw bytes into a pixel buffer.
///
/// Decoding is CPU-bound; the fetch stage calls it on the blocking pool.
pub trait ImageDecode: Send + Sync {
    fn decode(&self, bytes: &[u8], source_id: &str) -> PipelineResult<DynamicImage>;
}

/// Decoder backed by the `image` crate, sniffing the format from content.
pub struct ImageDecoder {
    limits: LimitsConfig,
}

impl ImageDecoder {
    /// Create a new decoder with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }
}

impl ImageDecode for ImageDecoder {
    fn decode(&self, bytes: &[u8], source_id: &str) -> PipelineResult<DynamicImage> {
        if bytes.is_empty() {
            return Err(PipelineError::Decode {
                source_id: source_id.to_string(),
                message: "empty body".to_string(),
            });
        }

        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                source_id: source_id.to_string(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        if reader.format().is_none() {
            return Err(PipelineError::Decode {
                source_id: source_id.to_string(),
                message: "unrecognized image format".to_string(),
            });
        }

        // Reject oversized images from the header before allocating pixels.
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| PipelineError::Decode {
                source_id: source_id.to_string(),
                message: e.to_string(),
            })?;
        let max_dim = self.limits.max_image_dimension;
        if width > max_dim || height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                source_id: source_id.to_string(),
                width,
                height,
                max_dim,
            });
        }

        let image = image::load_from_memory(bytes).map_err(|e| PipelineError::Decode {
            source_id: source_id.to_string(),
            message: e.to_string(),
        })?;
        let (width, height) = image.dimensions();
        tracing::trace!("Decoded {} ({}x{})", source_id, width, height);
        Ok(image)
    }
}
