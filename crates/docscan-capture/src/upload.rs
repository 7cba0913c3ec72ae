// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Uploaded photographs — extension allow-listing and decoding.

use std::path::Path;

use docscan_core::error::{DocscanError, Result};
use docscan_core::CaptureConfig;
use docscan_document::image::codec;
use image::DynamicImage;
use tracing::{debug, instrument};

/// Return the lowercased extension of `file_name` if it is on the allow
/// list, otherwise fail with `UnsupportedFormat`.
pub fn validate_extension(file_name: &str, allowed: &[String]) -> Result<String> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| {
            DocscanError::UnsupportedFormat(format!("'{file_name}' has no file extension"))
        })?;

    if allowed.iter().any(|a| a.eq_ignore_ascii_case(&extension)) {
        Ok(extension)
    } else {
        Err(DocscanError::UnsupportedFormat(format!(
            "'.{extension}' is not one of: {}",
            allowed.join(", ")
        )))
    }
}

/// Validate an upload's name and decode its bytes.
#[instrument(skip(data, config), fields(data_len = data.len()))]
pub fn load_upload(file_name: &str, data: &[u8], config: &CaptureConfig) -> Result<DynamicImage> {
    let extension = validate_extension(file_name, &config.allowed_extensions)?;
    debug!(extension, "Upload accepted");
    codec::decode(data)
}

/// Validate and decode an image file on disk.
pub fn load_path(path: impl AsRef<Path>, config: &CaptureConfig) -> Result<DynamicImage> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| DocscanError::invalid(format!("not a file path: {}", path.display())))?;
    validate_extension(name, &config.allowed_extensions)?;
    codec::open(path)
}
