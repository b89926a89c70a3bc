//! Durable storage for encoded images.

use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};

use crate::error::{GraylineError, PipelineError, PipelineResult};

/// Destination for encoded images, one file per storage key.
///
/// Encoding is CPU-bound; stages call `persist` on the blocking pool.
pub trait ImageStore: Send + Sync {
    /// Encode `image` and write it under `key`, returning where it landed.
    fn persist(&self, image: &DynamicImage, key: &str) -> PipelineResult<PathBuf>;
}

/// Writes PNG files into a root directory.
#[derive(Debug, Clone)]
pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    /// Open a store rooted at `root`, creating the directory if absent.
    ///
    /// Failure here is fatal for a run: every later write would fail too.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, GraylineError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| GraylineError::StorageInit {
            path: root.clone(),
            source,
        })?;
        tracing::debug!("Storage ready at {:?}", root);
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path a key is written to.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.png"))
    }
}

impl ImageStore for FsImageStore {
    fn persist(&self, image: &DynamicImage, key: &str) -> PipelineResult<PathBuf> {
        let path = self.path_for(key);
        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| PipelineError::Persist {
                path: path.clone(),
                message: e.to_string(),
            })?;
        Ok(path)
    }
}

/// Derive a filesystem-safe storage key from a source identifier.
///
/// Takes the last path segment (query string and fragment removed) and
/// replaces anything outside `[A-Za-z0-9._-]` with `_`. Distinct identifiers
/// sharing a final segment map to the same key.
pub fn storage_key(source_id: &str) -> String {
    let without_suffix = source_id
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    let segment = without_suffix.rsplit('/').next().unwrap_or_default();

    let key: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    // "." and ".." would escape or alias the root.
    if key.is_empty() || key.chars().all(|c| c == '.') {
        "image".to_string()
    } else {
        key
    }
}
