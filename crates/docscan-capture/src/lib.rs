// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan-capture — Where photographs come from: uploaded files,
// IP-camera snapshot URLs and inline base64 data URLs.

pub mod snapshot;
pub mod upload;

pub use snapshot::{SnapshotClient, is_url};
pub use upload::{load_path, load_upload, validate_extension};

use docscan_core::CaptureConfig;
use docscan_core::error::Result;
use docscan_document::image::codec::decode_base64_image;
use image::DynamicImage;

/// A photograph to scan, named by path or URL, or given inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    File(std::path::PathBuf),
    Url(String),
    /// `data:image/...;base64,...`
    DataUrl(String),
}

impl ImageSource {
    /// Classify a command-line style input.
    pub fn parse(input: &str) -> Self {
        if input.starts_with("data:") {
            Self::DataUrl(input.to_string())
        } else if is_url(input) {
            Self::Url(input.to_string())
        } else {
            Self::File(input.into())
        }
    }

    /// Load and decode the photograph.
    pub async fn load(&self, config: &CaptureConfig) -> Result<DynamicImage> {
        match self {
            Self::File(path) => load_path(path, config),
            Self::Url(url) => SnapshotClient::from_config(config)?.fetch(url).await,
            Self::DataUrl(data) => decode_base64_image(data),
        }
    }
}
