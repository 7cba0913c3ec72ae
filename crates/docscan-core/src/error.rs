// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Docscan.

use thiserror::Error;

/// Top-level error type for all Docscan operations.
///
/// A detection pass that finds no document is *not* an error; see
/// [`crate::Detection::NotFound`].
#[derive(Debug, Error)]
pub enum DocscanError {
    // -- Input errors --
    /// Malformed or unreadable image, wrong point count, or degenerate geometry.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),

    // -- Capture errors --
    #[error("could not fetch image from {url}: {reason}")]
    RemoteFetch { url: String, reason: String },

    // -- Output errors --
    #[error("encoding failed: {0}")]
    Encode(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DocscanError {
    /// Shorthand for building an [`DocscanError::InvalidInput`].
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::InvalidInput(detail.into())
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocscanError>;
