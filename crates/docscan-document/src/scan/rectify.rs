// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification — warp a four-cornered region onto an upright
// rectangle sized from the region's own edge lengths.

use docscan_core::error::{DocscanError, Result};
use docscan_core::Quadrilateral;
use image::DynamicImage;
use imageproc::geometric_transformations::Projection;
use tracing::{debug, info, instrument};

use crate::geometry::{euclidean_distance, order_corners, polygon_area};
use crate::image::codec::ensure_not_empty;
use crate::image::warp::resample_replicate;

/// Longest side accepted for a rectified page.
pub const MAX_OUTPUT_SIDE: u32 = 20_000;

/// Produces a top-down view of a document from its four corners.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rectifier;

impl Rectifier {
    pub fn new() -> Self {
        Self
    }

    /// Output size for `quad`: the floor of the longer of each pair of
    /// opposite sides.
    pub fn target_size(&self, quad: &Quadrilateral) -> Result<(u32, u32)> {
        let ordered = order_corners(quad.points())?;
        let [tl, tr, br, bl] = *ordered.points();

        let width = euclidean_distance(&br, &bl).max(euclidean_distance(&tr, &tl));
        let height = euclidean_distance(&tr, &br).max(euclidean_distance(&tl, &bl));
        let (width, height) = (width.floor(), height.floor());

        if width < 2.0 || height < 2.0 {
            return Err(DocscanError::invalid(format!(
                "degenerate quadrilateral: output would be {width}x{height}"
            )));
        }
        if width > MAX_OUTPUT_SIDE as f64 || height > MAX_OUTPUT_SIDE as f64 {
            return Err(DocscanError::invalid(format!(
                "corners too far apart: output would be {width}x{height}, limit is {MAX_OUTPUT_SIDE}"
            )));
        }
        Ok((width as u32, height as u32))
    }

    /// Warp the region bounded by `quad` onto a `width` x `height` canvas
    /// (see [`Rectifier::target_size`]). Corners may be given in any order.
    ///
    /// Samples falling outside the source replicate its border. Single-channel
    /// input stays single-channel.
    #[instrument(skip_all, fields(corners = ?quad.to_pairs()))]
    pub fn rectify(&self, image: &DynamicImage, quad: &Quadrilateral) -> Result<DynamicImage> {
        ensure_not_empty(image)?;

        let ordered = order_corners(quad.points())?;
        if polygon_area(ordered.points()) < 1.0 {
            return Err(DocscanError::invalid(
                "degenerate quadrilateral: corners are coincident or collinear",
            ));
        }
        let (width, height) = self.target_size(&ordered)?;

        let (w, h) = ((width - 1) as f32, (height - 1) as f32);
        let dest = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
        let src = ordered.points().map(|p| (p.x as f32, p.y as f32));

        // Maps output pixels back into the photograph.
        let to_source = Projection::from_control_points(dest, src).ok_or_else(|| {
            DocscanError::invalid("degenerate quadrilateral: no perspective transform fits the corners")
        })?;
        debug!(width, height, "Perspective transform computed");

        let page = resample_replicate(image, width, height, move |x, y| to_source * (x, y));

        info!(width, height, "Page rectified");
        Ok(page)
    }
}
