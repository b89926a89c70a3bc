//! Shared mapping from source identifier to final grayscale image.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use image::DynamicImage;

/// Result registry shared by every collect stage of a run.
///
/// The mutex is owned by the registry and only held for the map operation
/// itself; callers never do I/O while holding it.
#[derive(Debug, Default)]
pub struct ResultRegistry {
    entries: Mutex<HashMap<String, Arc<DynamicImage>>>,
}

impl ResultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `source_id`.
    ///
    /// Returns the previous image if the key was already present.
    pub fn insert(
        &self,
        source_id: impl Into<String>,
        image: Arc<DynamicImage>,
    ) -> Option<Arc<DynamicImage>> {
        self.lock().insert(source_id.into(), image)
    }

    pub fn get(&self, source_id: &str) -> Option<Arc<DynamicImage>> {
        self.lock().get(source_id).cloned()
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.lock().contains_key(source_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Registered identifiers, sorted for deterministic output.
    pub fn source_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<DynamicImage>>> {
        // A collector that panicked mid-insert leaves a map that is still
        // structurally valid.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
