// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document boundary detection — downscale, blur, Canny edges, morphological
// cleanup, contour tracing, and four-vertex polygon search.

use docscan_core::error::Result;
use docscan_core::{Contour, Detection, DetectionConfig, Point2D, Quadrilateral};
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::contours::{self as traced, BorderType};
use imageproc::distance_transform::Norm;
use imageproc::drawing::draw_line_segment_mut;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::{close, dilate};
use tracing::{debug, info, instrument};

use crate::geometry::{
    Line, approximate_closed_polygon, euclidean_distance, is_convex, order_corners, polygon_area,
};
use crate::image::adjust::gaussian_sigma;
use crate::image::codec::ensure_not_empty;

/// Output of a detection pass.
#[derive(Debug, Clone)]
pub struct DetectionResult {
    /// The input image, with the detected outline drawn on it when found.
    /// Pixel-identical to the input otherwise.
    pub preview: DynamicImage,
    pub detection: Detection,
}

/// Finds the outline of a paper document in a photograph.
pub struct BoundaryDetector {
    config: DetectionConfig,
}

/// A traced contour with its place in the border hierarchy.
struct Candidate {
    index: usize,
    parent: Option<usize>,
    is_hole: bool,
    contour: Contour,
    area: f64,
}

impl BoundaryDetector {
    pub fn new(config: DetectionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn with_defaults() -> Self {
        Self {
            config: DetectionConfig::default(),
        }
    }

    /// Detect the document outline.
    ///
    /// Contours are tried largest first; the first whose simplified polygon
    /// has exactly four vertices wins. The returned quadrilateral is in
    /// original-image coordinates and ordered top-left, top-right,
    /// bottom-right, bottom-left. Finding nothing is not an error.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect(&self, image: &DynamicImage) -> Result<DetectionResult> {
        ensure_not_empty(image)?;

        let (working, scale_x, scale_y) = self.working_copy(image);
        let mask = self.edge_mask(&working);
        let detection = match self.find_quadrilateral(&mask)? {
            Some(quad) => {
                let rescaled = quad
                    .points()
                    .map(|p| Point2D::new(p.x * scale_x, p.y * scale_y));
                Detection::Found(Quadrilateral::new(rescaled)?)
            }
            None => Detection::NotFound,
        };

        match &detection {
            Detection::Found(quad) => info!(corners = ?quad.to_pairs(), "Document outline found"),
            Detection::NotFound => info!("No four-sided outline found"),
        }

        let preview = match &detection {
            Detection::Found(quad) => self.draw_preview(image, quad),
            Detection::NotFound => image.clone(),
        };

        Ok(DetectionResult { preview, detection })
    }

    /// Draw `quad` as a closed outline in the configured overlay colour.
    /// Single-channel input is promoted to RGB so the colour shows.
    pub fn draw_preview(&self, image: &DynamicImage, quad: &Quadrilateral) -> DynamicImage {
        let mut canvas = image.to_rgb8();
        draw_outline(
            &mut canvas,
            quad,
            Rgb(self.config.overlay_color),
            self.config.overlay_width,
        );
        DynamicImage::ImageRgb8(canvas)
    }

    // -- Stages ---------------------------------------------------------------

    /// Grayscale copy no taller than the working height, plus the factors
    /// mapping its coordinates back to the original.
    fn working_copy(&self, image: &DynamicImage) -> (GrayImage, f64, f64) {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        let target_h = self.config.working_height;
        if height <= target_h {
            return (gray, 1.0, 1.0);
        }

        let target_w = ((width as f64 * target_h as f64 / height as f64).round() as u32).max(1);
        debug!(target_w, target_h, "Downscaling for detection");
        let small = imageops::resize(&gray, target_w, target_h, FilterType::Triangle);
        (
            small,
            width as f64 / target_w as f64,
            height as f64 / target_h as f64,
        )
    }

    /// Blur, Canny, then dilate and close so broken edges join into
    /// closed outlines.
    fn edge_mask(&self, gray: &GrayImage) -> GrayImage {
        let blurred = if self.config.blur_kernel > 1 {
            gaussian_blur_f32(gray, gaussian_sigma(self.config.blur_kernel))
        } else {
            gray.clone()
        };
        let edges = canny(&blurred, self.config.canny_low, self.config.canny_high);

        // LInf radius k is a (2k+1) square structuring element.
        let radius = (self.config.morph_kernel / 2) as u8;
        let dilated = dilate(&edges, Norm::LInf, radius);
        close(&dilated, Norm::LInf, radius)
    }

    fn find_quadrilateral(&self, mask: &GrayImage) -> Result<Option<Quadrilateral>> {
        let traces = traced::find_contours::<i32>(mask);
        let mut candidates: Vec<Candidate> = traces
            .iter()
            .enumerate()
            .filter(|(_, trace)| trace.points.len() >= 4)
            .map(|(index, trace)| {
                let contour = Contour::new(
                    trace
                        .points
                        .iter()
                        .map(|p| Point2D::new(p.x as f64, p.y as f64))
                        .collect(),
                );
                let area = polygon_area(&contour.points);
                Candidate {
                    index,
                    parent: trace.parent,
                    is_hole: matches!(trace.border_type, BorderType::Hole),
                    contour,
                    area,
                }
            })
            .collect();
        candidates.sort_by(|a, b| b.area.total_cmp(&a.area));
        debug!(contours = candidates.len(), "Contours traced");

        for candidate in &candidates {
            let Some(quad) = self.approximate_quad(&candidate.contour)? else {
                continue;
            };
            if self.config.require_convex && !is_convex(&quad) {
                debug!(index = candidate.index, "Skipping non-convex candidate");
                continue;
            }

            if self.config.refine_edge_band && !candidate.is_hole {
                let inner = self.inner_edge(&candidates, candidate);
                if let Some(refined) = self.fit_to_edge_band(&quad, candidate, inner) {
                    debug!(
                        index = candidate.index,
                        with_hole = inner.is_some(),
                        "Outline refitted to edge band"
                    );
                    return Ok(Some(refined));
                }
                debug!(index = candidate.index, "Edge band refit rejected; keeping outline");
            }
            return Ok(Some(quad));
        }
        Ok(None)
    }

    /// Simplified, ordered four-vertex outline of `contour`, if it has one.
    fn approximate_quad(&self, contour: &Contour) -> Result<Option<Quadrilateral>> {
        let epsilon = self.config.approx_epsilon_ratio * contour.perimeter();
        let polygon = approximate_closed_polygon(&contour.points, epsilon);
        if polygon.len() != 4 {
            return Ok(None);
        }
        order_corners(&polygon).map(Some)
    }

    /// The inner boundary of the edge band around `outer`: its largest hole
    /// child, unless that is only a small enclosed blob.
    fn inner_edge<'a>(
        &self,
        candidates: &'a [Candidate],
        outer: &Candidate,
    ) -> Option<&'a Candidate> {
        // Candidates are sorted by area, so the first match is the largest.
        candidates
            .iter()
            .find(|c| c.is_hole && c.parent == Some(outer.index))
            .filter(|child| child.area >= outer.area * 0.5)
    }

    /// Re-fit each side of `quad` as a straight line and intersect them.
    ///
    /// Only the middle of each side is used, since dilation rounds the
    /// band's corners. With a hole the side is the centre line between the
    /// band's outer and inner rims; without one the outer rim is moved in
    /// by the band's reach.
    fn fit_to_edge_band(
        &self,
        quad: &Quadrilateral,
        outer: &Candidate,
        inner: Option<&Candidate>,
    ) -> Option<Quadrilateral> {
        let corners = quad.points();
        let centre = Point2D::new(
            corners.iter().map(|p| p.x).sum::<f64>() / 4.0,
            corners.iter().map(|p| p.y).sum::<f64>() / 4.0,
        );
        let outer_sides = split_by_side(&outer.contour.points, quad);
        let inner_sides = inner.map(|hole| split_by_side(&hole.contour.points, quad));
        let radius = (self.config.morph_kernel / 2) as f64;

        let mut lines = Vec::with_capacity(4);
        for side in 0..4 {
            let rim = fit_side(&outer_sides[side])?.facing_away_from(&centre);
            let line = match &inner_sides {
                Some(sides) => rim.midline(&fit_side(&sides[side])?)?,
                None => {
                    let reach = (radius + 0.5) * (rim.normal.x.abs() + rim.normal.y.abs());
                    rim.shifted(-reach)
                }
            };
            lines.push(line);
        }

        let refined = [
            lines[3].intersect(&lines[0])?,
            lines[0].intersect(&lines[1])?,
            lines[1].intersect(&lines[2])?,
            lines[2].intersect(&lines[3])?,
        ];

        let shortest = (0..4)
            .map(|i| euclidean_distance(&corners[i], &corners[(i + 1) % 4]))
            .fold(f64::INFINITY, f64::min);
        let drifted = refined
            .iter()
            .zip(corners)
            .any(|(new, old)| euclidean_distance(new, old) > shortest / 4.0);
        if drifted {
            return None;
        }
        order_corners(&refined).ok()
    }
}

/// Fewest contour points a side needs before its line fit is trusted.
const MIN_SIDE_POINTS: usize = 8;

fn fit_side(points: &[Point2D]) -> Option<Line> {
    if points.len() < MIN_SIDE_POINTS {
        return None;
    }
    Line::fit(points)
}

/// Group contour points by the side of `quad` they lie closest to, keeping
/// only points that project onto the middle 60% of that side.
fn split_by_side(points: &[Point2D], quad: &Quadrilateral) -> [Vec<Point2D>; 4] {
    let corners = quad.points();
    let mut sides: [Vec<Point2D>; 4] = Default::default();

    for p in points {
        let mut best: Option<(usize, f64)> = None;
        for side in 0..4 {
            let (a, b) = (corners[side], corners[(side + 1) % 4]);
            let (ex, ey) = (b.x - a.x, b.y - a.y);
            let length_sq = ex * ex + ey * ey;
            if length_sq < f64::EPSILON {
                continue;
            }
            let t = ((p.x - a.x) * ex + (p.y - a.y) * ey) / length_sq;
            if !(0.2..=0.8).contains(&t) {
                continue;
            }
            let distance = ((p.x - a.x) * ey - (p.y - a.y) * ex).abs() / length_sq.sqrt();
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((side, distance));
            }
        }
        if let Some((side, _)) = best {
            sides[side].push(*p);
        }
    }
    sides
}

/// Closed outline of `quad` with the given stroke width.
fn draw_outline(canvas: &mut RgbImage, quad: &Quadrilateral, colour: Rgb<u8>, width: u32) {
    let reach = (width.max(1) as i32 - 1) / 2;
    let extra = (width.max(1) as i32 - 1) % 2;
    let points = quad.points();
    for i in 0..4 {
        let a = points[i];
        let b = points[(i + 1) % 4];
        for ox in -reach..=reach + extra {
            for oy in -reach..=reach + extra {
                draw_line_segment_mut(
                    canvas,
                    ((a.x as f32) + ox as f32, (a.y as f32) + oy as f32),
                    ((b.x as f32) + ox as f32, (b.y as f32) + oy as f32),
                    colour,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::drawing::draw_polygon_mut;
    use imageproc::point::Point;

    /// Corners of a `side`-pixel square centred at `centre`, turned by
    /// `degrees`, ordered clockwise from the top-left-most corner.
    fn rotated_square(centre: f64, side: f64, degrees: f64) -> Vec<Point<i32>> {
        let half = side / 2.0;
        let (sin, cos) = degrees.to_radians().sin_cos();
        [(-half, -half), (half, -half), (half, half), (-half, half)]
            .iter()
            .map(|&(dx, dy)| {
                Point::new(
                    (centre + dx * cos - dy * sin).round() as i32,
                    (centre + dx * sin + dy * cos).round() as i32,
                )
            })
            .collect()
    }

    fn white_on_black(width: u32, height: u32, polygon: &[Point<i32>]) -> GrayImage {
        let mut img = GrayImage::new(width, height);
        draw_polygon_mut(&mut img, polygon, Luma([255u8]));
        img
    }

    fn nearest_distance(target: &Point<i32>, quad: &Quadrilateral) -> f64 {
        let target = Point2D::new(target.x as f64, target.y as f64);
        quad.points()
            .iter()
            .map(|p| euclidean_distance(p, &target))
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn black_image_is_not_found_with_untouched_preview() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(320, 240));
        let result = BoundaryDetector::with_defaults().detect(&img).unwrap();
        assert_eq!(result.detection, Detection::NotFound);
        assert_eq!(result.preview, img);
    }

    #[test]
    fn finds_rotated_square() {
        let corners = rotated_square(250.0, 200.0, 15.0);
        let img = DynamicImage::ImageLuma8(white_on_black(500, 500, &corners));

        let result = BoundaryDetector::with_defaults().detect(&img).unwrap();
        let quad = result.detection.quadrilateral().copied().expect("square should be found");

        for corner in &corners {
            let d = nearest_distance(corner, &quad);
            assert!(d < 3.0, "corner {corner:?} is {d:.2} px from {:?}", quad.to_pairs());
        }
        // Found outlines are already in canonical order.
        assert_eq!(order_corners(quad.points()).unwrap(), quad);
    }

    #[test]
    fn preview_is_colour_with_overlay() {
        let corners = rotated_square(150.0, 120.0, 0.0);
        let img = DynamicImage::ImageLuma8(white_on_black(300, 300, &corners));

        let result = BoundaryDetector::with_defaults().detect(&img).unwrap();
        assert!(result.detection.is_found());
        let preview = result.preview.as_rgb8().expect("preview should be RGB");
        assert_eq!(preview.dimensions(), (300, 300));
        assert!(preview.pixels().any(|p| p.0 == [255, 255, 0]));
    }

    #[test]
    fn large_images_are_detected_in_original_coordinates() {
        let polygon = [
            Point::new(200, 150),
            Point::new(1100, 150),
            Point::new(1100, 850),
            Point::new(200, 850),
        ];
        let img = DynamicImage::ImageLuma8(white_on_black(1300, 1000, &polygon));

        let result = BoundaryDetector::with_defaults().detect(&img).unwrap();
        let quad = result.detection.quadrilateral().copied().expect("rectangle should be found");
        for corner in &polygon {
            let d = nearest_distance(corner, &quad);
            assert!(d < 8.0, "corner {corner:?} is {d:.2} px off");
        }
    }

    #[test]
    fn convexity_filter_keeps_convex_outlines() {
        let config = DetectionConfig {
            require_convex: true,
            ..Default::default()
        };
        let corners = rotated_square(200.0, 150.0, 10.0);
        let img = DynamicImage::ImageLuma8(white_on_black(400, 400, &corners));
        let result = BoundaryDetector::new(config).unwrap().detect(&img).unwrap();
        assert!(result.detection.is_found());
    }

    /// Pixel trace around the axis-aligned square `[lo, hi]`.
    fn square_trace(index: usize, lo: i32, hi: i32, parent: Option<usize>) -> Candidate {
        let mut points = Vec::new();
        for x in lo..hi {
            points.push(Point2D::new(x as f64, lo as f64));
        }
        for y in lo..hi {
            points.push(Point2D::new(hi as f64, y as f64));
        }
        for x in (lo + 1..=hi).rev() {
            points.push(Point2D::new(x as f64, hi as f64));
        }
        for y in (lo + 1..=hi).rev() {
            points.push(Point2D::new(lo as f64, y as f64));
        }
        let area = polygon_area(&points);
        Candidate {
            index,
            parent,
            is_hole: parent.is_some(),
            contour: Contour::new(points),
            area,
        }
    }

    fn assert_corners(quad: &Quadrilateral, expected: [[f64; 2]; 4]) {
        for (got, want) in quad.to_pairs().iter().zip(expected) {
            assert!(
                (got[0] - want[0]).abs() < 1e-6 && (got[1] - want[1]).abs() < 1e-6,
                "got {:?}, expected {expected:?}",
                quad.to_pairs()
            );
        }
    }

    #[test]
    fn edge_band_refit_centres_between_rims() {
        let detector = BoundaryDetector::with_defaults();
        let outer = square_trace(0, 0, 100, None);
        let hole = square_trace(1, 6, 94, Some(0));
        let quad = detector.approximate_quad(&outer.contour).unwrap().unwrap();

        let refined = detector.fit_to_edge_band(&quad, &outer, Some(&hole)).unwrap();
        assert_corners(&refined, [[3.0, 3.0], [97.0, 3.0], [97.0, 97.0], [3.0, 97.0]]);
    }

    #[test]
    fn edge_band_refit_without_hole_insets_by_reach() {
        // A 5x5 kernel reaches 2.5 px past the edge on an upright side.
        let detector = BoundaryDetector::with_defaults();
        let outer = square_trace(0, 0, 100, None);
        let quad = detector.approximate_quad(&outer.contour).unwrap().unwrap();

        let refined = detector.fit_to_edge_band(&quad, &outer, None).unwrap();
        assert_corners(&refined, [[2.5, 2.5], [97.5, 2.5], [97.5, 97.5], [2.5, 97.5]]);
    }

    #[test]
    fn small_hole_is_not_an_inner_edge() {
        let detector = BoundaryDetector::with_defaults();
        let outer = square_trace(0, 0, 100, None);
        let blob = square_trace(1, 40, 60, Some(0));
        let band = square_trace(2, 6, 94, Some(0));

        let candidates = vec![outer, blob];
        assert!(detector.inner_edge(&candidates, &candidates[0]).is_none());

        let candidates = vec![square_trace(0, 0, 100, None), band];
        assert_eq!(
            detector.inner_edge(&candidates, &candidates[0]).map(|c| c.index),
            Some(2)
        );
    }

    #[test]
    fn rejects_invalid_configuration() {
        let config = DetectionConfig {
            blur_kernel: 4,
            ..Default::default()
        };
        assert!(BoundaryDetector::new(config).is_err());
    }

    #[test]
    fn rejects_empty_image() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(BoundaryDetector::with_defaults().detect(&img).is_err());
    }

    #[test]
    fn outline_width_is_honoured() {
        let quad = Quadrilateral::new([
            Point2D::new(10.0, 10.0),
            Point2D::new(40.0, 10.0),
            Point2D::new(40.0, 40.0),
            Point2D::new(10.0, 40.0),
        ])
        .unwrap();
        let mut canvas = RgbImage::new(50, 50);
        draw_outline(&mut canvas, &quad, Rgb([255, 255, 0]), 3);
        // Horizontal edge at y = 10 spans rows 9..=11.
        for y in 9..=11 {
            assert_eq!(canvas.get_pixel(25, y).0, [255, 255, 0]);
        }
        assert_eq!(canvas.get_pixel(25, 8).0, [0, 0, 0]);
        assert_eq!(canvas.get_pixel(25, 12).0, [0, 0, 0]);
    }
}
