// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Docscan pipeline.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{DocscanError, Result};

/// A point in image space (pixels, origin top-left, y pointing down).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Midpoint between `self` and `other`.
    pub fn midpoint(&self, other: &Point2D) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Four corner points of a document region.
///
/// When produced by corner ordering the points are in canonical order
/// `[top_left, top_right, bottom_right, bottom_left]`. A quadrilateral built
/// from raw coordinates (a detected polygon or a manual edit) keeps the order
/// it was given until it is ordered.
///
/// Serialises as a plain list of four `[x, y]` pairs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[f64; 2]>", into = "Vec<[f64; 2]>")]
pub struct Quadrilateral {
    points: [Point2D; 4],
}

impl Quadrilateral {
    /// Build from four points, rejecting non-finite coordinates.
    pub fn new(points: [Point2D; 4]) -> Result<Self> {
        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(DocscanError::invalid(format!(
                "corner coordinates must be finite, got ({}, {})",
                bad.x, bad.y
            )));
        }
        Ok(Self { points })
    }

    /// Build from a list of `[x, y]` pairs. Exactly four pairs are required.
    pub fn from_pairs(pairs: &[[f64; 2]]) -> Result<Self> {
        let points: [Point2D; 4] = pairs
            .iter()
            .map(|[x, y]| Point2D::new(*x, *y))
            .collect::<Vec<_>>()
            .try_into()
            .map_err(|v: Vec<Point2D>| {
                DocscanError::invalid(format!("expected 4 corner points, got {}", v.len()))
            })?;
        Self::new(points)
    }

    /// The plain `[[x, y]; 4]` representation used on the wire.
    pub fn to_pairs(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|p| [p.x, p.y]).collect()
    }

    pub fn points(&self) -> &[Point2D; 4] {
        &self.points
    }

    pub fn top_left(&self) -> Point2D {
        self.points[0]
    }

    pub fn top_right(&self) -> Point2D {
        self.points[1]
    }

    pub fn bottom_right(&self) -> Point2D {
        self.points[2]
    }

    pub fn bottom_left(&self) -> Point2D {
        self.points[3]
    }
}

impl TryFrom<Vec<[f64; 2]>> for Quadrilateral {
    type Error = DocscanError;

    fn try_from(pairs: Vec<[f64; 2]>) -> Result<Self> {
        Self::from_pairs(&pairs)
    }
}

impl From<Quadrilateral> for Vec<[f64; 2]> {
    fn from(quad: Quadrilateral) -> Self {
        quad.to_pairs()
    }
}

/// A closed boundary candidate traced from a binary edge map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub points: Vec<Point2D>,
}

impl Contour {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    /// Length of the closed boundary, including the closing segment.
    pub fn perimeter(&self) -> f64 {
        let n = self.points.len();
        if n < 2 {
            return 0.0;
        }
        (0..n)
            .map(|i| {
                let a = self.points[i];
                let b = self.points[(i + 1) % n];
                (b.x - a.x).hypot(b.y - a.y)
            })
            .sum()
    }
}

/// Result of a boundary detection pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Detection {
    /// A four-sided document outline, in original-image coordinates.
    Found(Quadrilateral),
    /// No four-vertex contour was found. The caller may supply corners manually.
    NotFound,
}

impl Detection {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn quadrilateral(&self) -> Option<&Quadrilateral> {
        match self {
            Self::Found(quad) => Some(quad),
            Self::NotFound => None,
        }
    }
}

/// Colour treatment applied to the rectified page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterMode {
    /// Pass the image through unchanged.
    #[default]
    Color,
    /// Single-channel intensity.
    #[serde(alias = "gray")]
    Grayscale,
    /// Otsu-binarised single-channel image (values 0 and 255 only).
    #[serde(alias = "bw")]
    BlackAndWhite,
}

impl FilterMode {
    /// Short wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Grayscale => "gray",
            Self::BlackAndWhite => "bw",
        }
    }
}

impl FromStr for FilterMode {
    type Err = DocscanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "color" | "colour" => Ok(Self::Color),
            "gray" | "grey" | "grayscale" | "greyscale" => Ok(Self::Grayscale),
            "bw" | "blackandwhite" | "binary" => Ok(Self::BlackAndWhite),
            other => Err(DocscanError::invalid(format!("unknown filter mode '{other}'"))),
        }
    }
}

/// Post-rectification adjustments, applied as rotate → filter →
/// brightness/contrast/smooth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdjustmentParams {
    pub filter_mode: FilterMode,
    /// Signed offset added to every channel, typically -100..=100.
    pub brightness: i32,
    /// Positive multiplier for every channel, typically 0.5..=3.0.
    pub contrast: f32,
    /// Blur kernel size: 0 (off) or a positive odd integer.
    pub smooth_radius: u32,
    /// Rotation in degrees. 90, 180 and 270 are lossless clockwise quarter
    /// turns; any other value turns counter-clockwise about the centre.
    pub rotation_degrees: i32,
}

impl Default for AdjustmentParams {
    fn default() -> Self {
        Self {
            filter_mode: FilterMode::Color,
            brightness: 0,
            contrast: 1.0,
            smooth_radius: 0,
            rotation_degrees: 0,
        }
    }
}

impl AdjustmentParams {
    /// Reject parameters that would produce garbage instead of an image.
    pub fn validate(&self) -> Result<()> {
        if !self.contrast.is_finite() || self.contrast <= 0.0 {
            return Err(DocscanError::invalid(format!(
                "contrast must be a positive number, got {}",
                self.contrast
            )));
        }
        if self.smooth_radius != 0 && self.smooth_radius % 2 == 0 {
            return Err(DocscanError::invalid(format!(
                "smooth radius must be 0 or odd, got {}",
                self.smooth_radius
            )));
        }
        Ok(())
    }
}

/// Output formats for the final page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Jpeg,
    Png,
    /// Single-page document sized exactly to the image.
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Pdf => "pdf",
        }
    }

    /// Infer the export format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = DocscanError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_extension(s)
            .ok_or_else(|| DocscanError::UnsupportedFormat(format!("export format '{s}'")))
    }
}
