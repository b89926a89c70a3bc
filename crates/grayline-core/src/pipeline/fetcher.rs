//! Retrieval of raw image bytes.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;

use crate::config::FetchConfig;
use crate::error::{PipelineError, PipelineResult, TimeoutStage};

/// Source of raw bytes for an identifier.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the fetch stage holds an `Arc<dyn Fetcher>`).
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Retrieve the full content behind `source_id`.
    async fn fetch(&self, source_id: &str) -> PipelineResult<Vec<u8>>;
}

/// Fetches identifiers as HTTP(S) URLs.
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout_ms: u64,
    max_download_mb: u64,
    max_download_bytes: u64,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            timeout_ms: config.timeout_ms,
            max_download_mb: config.max_download_mb,
            max_download_bytes: config.max_download_bytes(),
        })
    }

    fn map_error(&self, source_id: &str, e: reqwest::Error) -> PipelineError {
        if e.is_timeout() {
            PipelineError::Timeout {
                source_id: source_id.to_string(),
                stage: TimeoutStage::Fetch,
                timeout_ms: self.timeout_ms,
            }
        } else {
            PipelineError::Fetch {
                source_id: source_id.to_string(),
                message: e.to_string(),
            }
        }
    }

    fn too_large(&self, source_id: &str) -> PipelineError {
        PipelineError::DownloadTooLarge {
            source_id: source_id.to_string(),
            max_mb: self.max_download_mb,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, source_id: &str) -> PipelineResult<Vec<u8>> {
        let response = self
            .client
            .get(source_id)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.map_error(source_id, e))?;

        if response
            .content_length()
            .is_some_and(|len| len > self.max_download_bytes)
        {
            return Err(self.too_large(source_id));
        }

        // The response body is dropped at the end of this call.
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.map_error(source_id, e))?;
            if (body.len() + chunk.len()) as u64 > self.max_download_bytes {
                return Err(self.too_large(source_id));
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!("Fetched {} bytes from {}", body.len(), source_id);
        Ok(body)
    }
}
