// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image adjuster — rotation, colour filters (colour / grayscale / Otsu
// black-and-white), and brightness/contrast/smoothing for rectified pages.

use docscan_core::error::{DocscanError, Result};
use docscan_core::{AdjustmentParams, FilterMode};
use image::{DynamicImage, Pixel};
use imageproc::contrast::{ThresholdType, otsu_level, threshold as threshold_image};
use imageproc::definitions::Image;
use imageproc::filter::gaussian_blur_f32;
use tracing::{debug, info, instrument};

use super::codec::normalize_channels;
use super::warp::resample_replicate;

/// Post-processing pipeline operating on a single in-memory page.
///
/// All operations are non-destructive: each method consumes `self` and returns
/// a new `ImageAdjuster` wrapping the transformed image, enabling chaining.
///
/// ```ignore
/// let page = ImageAdjuster::from_dynamic(rectified)
///     .rotate(90)
///     .apply_filter(FilterMode::BlackAndWhite)
///     .adjust_brightness_contrast_smooth(10, 1.2, 3)?
///     .into_dynamic();
/// ```
pub struct ImageAdjuster {
    /// The current working image, always `Luma8` or `Rgb8`.
    image: DynamicImage,
}

impl ImageAdjuster {
    // -- Construction ---------------------------------------------------------

    /// Wrap a decoded image. Other pixel layouts are normalised to 8-bit
    /// gray or RGB.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self {
            image: normalize_channels(image),
        }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Composition ----------------------------------------------------------

    /// Apply rotate → filter → brightness/contrast/smooth, in that order.
    #[instrument(skip(self), fields(width = self.width(), height = self.height()))]
    pub fn apply(self, params: &AdjustmentParams) -> Result<Self> {
        params.validate()?;
        info!(
            filter = params.filter_mode.as_str(),
            params.brightness,
            params.contrast,
            params.smooth_radius,
            params.rotation_degrees,
            "Adjusting page"
        );
        self.rotate(params.rotation_degrees)
            .apply_filter(params.filter_mode)
            .adjust_brightness_contrast_smooth(
                params.brightness,
                params.contrast,
                params.smooth_radius,
            )
    }

    // -- Rotation -------------------------------------------------------------

    /// Rotate by `degrees`.
    ///
    /// 90, 180 and 270 are exact clockwise quarter turns (width and height
    /// swap for 90/270). Any other angle, negative or above 360 included,
    /// turns counter-clockwise about the image centre on a canvas of the
    /// original size with bilinear sampling. Corners that leave the canvas
    /// are clipped and newly exposed border pixels replicate the nearest
    /// edge.
    #[instrument(skip(self))]
    pub fn rotate(self, degrees: i32) -> Self {
        let image = match degrees {
            0 => return self,
            90 => self.image.rotate90(),
            180 => self.image.rotate180(),
            270 => self.image.rotate270(),
            other => {
                debug!(degrees = other, "Arbitrary-angle rotation");
                rotate_about_center(&self.image, other as f32)
            }
        };
        Self { image }
    }

    // -- Filters --------------------------------------------------------------

    /// Apply a colour treatment.
    ///
    /// `Color` passes the image through; `Grayscale` converts to luma;
    /// `BlackAndWhite` converts to luma and splits at the Otsu threshold,
    /// producing only the values 0 and 255.
    #[instrument(skip(self))]
    pub fn apply_filter(self, mode: FilterMode) -> Self {
        let image = match mode {
            FilterMode::Color => return self,
            FilterMode::Grayscale => DynamicImage::ImageLuma8(self.image.to_luma8()),
            FilterMode::BlackAndWhite => {
                let gray = self.image.to_luma8();
                let threshold = otsu_level(&gray);
                debug!(threshold, "Otsu threshold computed");
                // Pixels strictly above the level become 255, the rest 0.
                DynamicImage::ImageLuma8(threshold_image(&gray, threshold, ThresholdType::Binary))
            }
        };
        Self { image }
    }

    // -- Tone -----------------------------------------------------------------

    /// Map every channel value `v` to `clamp(v * contrast + brightness, 0, 255)`
    /// and then, when `smooth_radius` is an odd kernel size above 1, blur
    /// with a Gaussian of that size. A kernel size of 1 is a no-op.
    #[instrument(skip(self))]
    pub fn adjust_brightness_contrast_smooth(
        self,
        brightness: i32,
        contrast: f32,
        smooth_radius: u32,
    ) -> Result<Self> {
        if !contrast.is_finite() || contrast <= 0.0 {
            return Err(DocscanError::invalid(format!(
                "contrast must be a positive number, got {contrast}"
            )));
        }
        if smooth_radius != 0 && smooth_radius % 2 == 0 {
            return Err(DocscanError::invalid(format!(
                "smooth radius must be 0 or odd, got {smooth_radius}"
            )));
        }

        let mut image = self.image;
        if brightness != 0 || contrast != 1.0 {
            let offset = brightness as f32;
            let tone = |v: u8| (v as f32 * contrast + offset).clamp(0.0, 255.0) as u8;
            image = match image {
                DynamicImage::ImageLuma8(gray) => DynamicImage::ImageLuma8(map_subpixels(gray, tone)),
                other => DynamicImage::ImageRgb8(map_subpixels(other.to_rgb8(), tone)),
            };
        }

        if smooth_radius > 1 {
            let sigma = gaussian_sigma(smooth_radius);
            debug!(smooth_radius, sigma, "Smoothing");
            image = match image {
                DynamicImage::ImageLuma8(gray) => {
                    DynamicImage::ImageLuma8(gaussian_blur_f32(&gray, sigma))
                }
                other => DynamicImage::ImageRgb8(gaussian_blur_f32(&other.to_rgb8(), sigma)),
            };
        }

        Ok(Self { image })
    }
}

/// Gaussian sigma matching a square kernel of `kernel_size` pixels.
pub(crate) fn gaussian_sigma(kernel_size: u32) -> f32 {
    (0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8).max(0.1)
}

fn map_subpixels<P>(mut image: Image<P>, f: impl Fn(u8) -> u8) -> Image<P>
where
    P: Pixel<Subpixel = u8>,
{
    for pixel in image.pixels_mut() {
        pixel.apply(|v| f(v));
    }
    image
}

/// Rotate counter-clockwise about the integer centre, keeping the canvas
/// size.
fn rotate_about_center(image: &DynamicImage, degrees: f32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let cx = (width / 2) as f32;
    let cy = (height / 2) as f32;
    let (sin, cos) = degrees.to_radians().sin_cos();

    // Output pixel -> source pixel is the opposite (clockwise) turn.
    resample_replicate(image, width, height, move |x, y| {
        let (dx, dy) = (x - cx, y - cy);
        (cos * dx - sin * dy + cx, sin * dx + cos * dy + cy)
    })
}
