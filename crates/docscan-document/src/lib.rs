// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan-document — The scanning core for Docscan.
//
// Provides corner geometry, document boundary detection, perspective
// rectification, page adjustment (rotate, colour filter, brightness/contrast,
// smoothing), image and PDF encoding, and the pipeline tying them together.

pub mod geometry;
pub mod image;
pub mod pdf;
pub mod pipeline;
pub mod scan;

// Re-export the primary structs so callers can use `docscan_document::Rectifier` etc.
pub use geometry::{euclidean_distance, order_corners};
pub use image::adjust::ImageAdjuster;
pub use pdf::writer::PdfWriter;
pub use pipeline::{ScanOutcome, ScanPipeline};
pub use scan::detect::{BoundaryDetector, DetectionResult};
pub use scan::rectify::Rectifier;
