//! Core data types flowing through and out of the pipeline.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// One image travelling through the pipeline.
///
/// Ownership moves from stage to stage through the channels, so a unit is
/// only ever touched by the stage currently holding it.
#[derive(Debug)]
pub struct WorkItem {
    /// Identifier the image was fetched from; registry key
    pub source_id: String,

    /// Current pixel buffer (original after fetch, grayscale after transform)
    pub image: DynamicImage,
}

impl WorkItem {
    pub fn new(source_id: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            source_id: source_id.into(),
            image,
        }
    }
}

/// Outcome of a complete pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RunSummary {
    /// Identifiers handed to the fetch stage
    pub submitted: usize,

    /// Entries in the result registry once all stages drained
    pub processed: usize,

    /// Identifiers whose bytes could not be retrieved
    pub fetch_failures: usize,

    /// Identifiers whose bytes could not be decoded
    pub decode_failures: usize,

    /// Originals that could not be written (still processed)
    pub input_persist_failures: usize,

    /// Grayscale results that could not be written (still registered)
    pub output_persist_failures: usize,

    /// Wall-clock duration of the run in seconds
    pub elapsed_seconds: f64,
}

impl RunSummary {
    /// Identifiers that never reached the registry.
    pub fn dropped(&self) -> usize {
        self.fetch_failures + self.decode_failures
    }

    /// Processing rate in images per second.
    pub fn images_per_second(&self) -> f64 {
        if self.elapsed_seconds > 0.0 {
            self.processed as f64 / self.elapsed_seconds
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_serialization() {
        let summary = RunSummary {
            submitted: 3,
            processed: 2,
            fetch_failures: 1,
            ..RunSummary::default()
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"processed\":2"));
        let back: RunSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }

    #[test]
    fn test_dropped_counts_fetch_and_decode() {
        let summary = RunSummary {
            submitted: 5,
            processed: 2,
            fetch_failures: 2,
            decode_failures: 1,
            output_persist_failures: 1,
            ..RunSummary::default()
        };
        assert_eq!(summary.dropped(), 3);
    }

    #[test]
    fn test_rate_with_zero_elapsed() {
        let summary = RunSummary {
            processed: 4,
            ..RunSummary::default()
        };
        assert_eq!(summary.images_per_second(), 0.0);
    }
}
