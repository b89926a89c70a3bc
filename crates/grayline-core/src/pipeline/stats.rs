//! Per-run failure counters shared by the stages.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::PipelineError;
use crate::types::RunSummary;

/// Failure counters updated by the stages as they skip or degrade items.
#[derive(Debug, Default)]
pub struct RunCounters {
    fetch_failures: AtomicUsize,
    decode_failures: AtomicUsize,
    input_persist_failures: AtomicUsize,
    output_persist_failures: AtomicUsize,
}

impl RunCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an item the fetch stage dropped before forwarding.
    pub fn record_dropped(&self, error: &PipelineError) {
        if error.is_fetch_failure() {
            self.fetch_failures.fetch_add(1, Ordering::Relaxed);
        } else {
            self.decode_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_input_persist_failure(&self) {
        self.input_persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_output_persist_failure(&self) {
        self.output_persist_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Build the run summary. Only meaningful once every stage has drained.
    pub fn summarize(&self, submitted: usize, processed: usize, elapsed: Duration) -> RunSummary {
        RunSummary {
            submitted,
            processed,
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            input_persist_failures: self.input_persist_failures.load(Ordering::Relaxed),
            output_persist_failures: self.output_persist_failures.load(Ordering::Relaxed),
            elapsed_seconds: elapsed.as_secs_f64(),
        }
    }
}
