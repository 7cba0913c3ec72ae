// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Remote camera snapshots — fetch a single still from an IP camera's
// snapshot URL over HTTP.

use std::time::Duration;

use docscan_core::error::{DocscanError, Result};
use docscan_core::CaptureConfig;
use docscan_document::image::codec;
use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// HTTP client for camera snapshot endpoints.
///
/// Each fetch is a single GET with a hard timeout. Failures are reported as
/// [`DocscanError::RemoteFetch`] and never retried.
#[derive(Debug, Clone)]
pub struct SnapshotClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl SnapshotClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocscanError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, timeout })
    }

    pub fn from_config(config: &CaptureConfig) -> Result<Self> {
        Self::new(Duration::from_secs(config.timeout_secs))
    }

    /// Download the raw snapshot bytes.
    #[instrument(skip(self))]
    pub async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        info!("Fetching camera snapshot");
        let remote = |reason: String| DocscanError::RemoteFetch {
            url: url.to_string(),
            reason,
        };

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                warn!(timeout_ms = self.timeout.as_millis() as u64, "Snapshot request timed out");
                remote(format!("timed out after {:?}", self.timeout))
            } else {
                remote(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(remote(format!("HTTP {status}")));
        }

        let bytes = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                remote(format!("timed out after {:?}", self.timeout))
            } else {
                remote(e.to_string())
            }
        })?;
        debug!(bytes = bytes.len(), "Snapshot downloaded");
        Ok(bytes.to_vec())
    }

    /// Download and decode a snapshot.
    pub async fn fetch(&self, url: &str) -> Result<DynamicImage> {
        let bytes = self.fetch_bytes(url).await?;
        codec::decode(&bytes).map_err(|e| DocscanError::RemoteFetch {
            url: url.to_string(),
            reason: format!("could not decode image bytes: {e}"),
        })
    }
}
