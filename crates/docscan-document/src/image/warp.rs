// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inverse-mapped resampling with edge replication.

use image::{DynamicImage, GrayImage, Luma, Pixel, Rgb, RgbImage};
use imageproc::definitions::{Clamp, Image};
use imageproc::geometric_transformations::{Interpolation, warp_into_with};

/// Resample `image` onto a `width` x `height` canvas.
///
/// `to_source` maps an output pixel coordinate to the source coordinate it
/// samples from. Source coordinates outside the image are clamped to the
/// nearest edge, so exposed borders replicate edge pixels instead of being
/// filled with a constant. Single-channel input stays single-channel; every
/// other layout is resampled as RGB.
pub(crate) fn resample_replicate<F>(
    image: &DynamicImage,
    width: u32,
    height: u32,
    to_source: F,
) -> DynamicImage
where
    F: Fn(f32, f32) -> (f32, f32) + Send + Sync,
{
    match image {
        DynamicImage::ImageLuma8(gray) => {
            let mut out = GrayImage::new(width, height);
            resample_into(gray, &to_source, Luma([255u8]), &mut out);
            DynamicImage::ImageLuma8(out)
        }
        other => {
            let converted;
            let rgb: &RgbImage = match other {
                DynamicImage::ImageRgb8(rgb) => rgb,
                _ => {
                    converted = other.to_rgb8();
                    &converted
                }
            };
            let mut out = RgbImage::new(width, height);
            resample_into(rgb, &to_source, Rgb([255u8, 255, 255]), &mut out);
            DynamicImage::ImageRgb8(out)
        }
    }
}

fn resample_into<P, F>(source: &Image<P>, to_source: &F, default: P, out: &mut Image<P>)
where
    P: Pixel + Send + Sync,
    <P as Pixel>::Subpixel: Send + Sync + Into<f32> + Clamp<f32>,
    F: Fn(f32, f32) -> (f32, f32) + Send + Sync,
{
    let (src_w, src_h) = source.dimensions();
    if src_w == 0 || src_h == 0 {
        return;
    }

    // Bilinear sampling reads the pixel to the right of and below the sample
    // point. One replicated row and column let the last ones be sampled
    // exactly.
    let padded = Image::<P>::from_fn(src_w + 1, src_h + 1, |x, y| {
        *source.get_pixel(x.min(src_w - 1), y.min(src_h - 1))
    });
    let (max_x, max_y) = ((src_w - 1) as f32, (src_h - 1) as f32);

    let mapping = |x: f32, y: f32| {
        let (sx, sy) = to_source(x, y);
        let sx = if sx.is_finite() { sx.clamp(0.0, max_x) } else { 0.0 };
        let sy = if sy.is_finite() { sy.clamp(0.0, max_y) } else { 0.0 };
        (sx, sy)
    };

    warp_into_with(&padded, mapping, Interpolation::Bilinear, default, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_mapping_copies_pixels() {
        let gray = GrayImage::from_fn(8, 6, |x, y| Luma([(x * 20 + y * 3) as u8]));
        let out = resample_replicate(&DynamicImage::ImageLuma8(gray.clone()), 8, 6, |x, y| (x, y));
        let out = out.as_luma8().expect("stays single-channel");

        for (x, y, px) in gray.enumerate_pixels() {
            let diff = (px.0[0] as i32 - out.get_pixel(x, y).0[0] as i32).abs();
            assert!(diff <= 1, "pixel ({x},{y}) differs by {diff}");
        }
    }

    #[test]
    fn last_row_and_column_are_reproduced_exactly() {
        let gray = GrayImage::from_fn(5, 4, |x, y| Luma([(x * 50 + y * 7) as u8]));
        let out = resample_replicate(&DynamicImage::ImageLuma8(gray.clone()), 5, 4, |x, y| (x, y));
        let out = out.as_luma8().unwrap();
        for y in 0..4 {
            assert_eq!(out.get_pixel(4, y), gray.get_pixel(4, y));
        }
        for x in 0..5 {
            assert_eq!(out.get_pixel(x, 3), gray.get_pixel(x, 3));
        }
    }

    #[test]
    fn single_pixel_source_fills_the_canvas() {
        let gray = GrayImage::from_pixel(1, 1, Luma([123]));
        let out = resample_replicate(&DynamicImage::ImageLuma8(gray), 3, 3, |x, y| (x * 0.5, y * 0.5));
        assert!(out.as_luma8().unwrap().pixels().all(|p| p.0[0] == 123));
    }

    #[test]
    fn outside_samples_replicate_edges() {
        let gray = GrayImage::from_fn(4, 4, |x, _| Luma([if x == 0 { 10 } else { 200 }]));
        let out = resample_replicate(&DynamicImage::ImageLuma8(gray), 4, 4, |x, y| (x - 100.0, y));
        let out = out.as_luma8().unwrap();
        assert!(out.pixels().all(|p| p.0[0] == 10));
    }

    #[test]
    fn colour_input_resamples_as_rgb() {
        let rgba = image::RgbaImage::from_pixel(5, 5, image::Rgba([10, 20, 30, 255]));
        let out = resample_replicate(&DynamicImage::ImageRgba8(rgba), 3, 2, |x, y| (x, y));
        assert_eq!((out.width(), out.height()), (3, 2));
        assert_eq!(out.as_rgb8().unwrap().get_pixel(1, 1), &Rgb([10, 20, 30]));
    }
}
