// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image codec — decode uploads and snapshots, encode pages as JPEG/PNG, and
// the base64 transport form used by browser front-ends.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use docscan_core::error::{DocscanError, Result};
use image::{DynamicImage, ImageFormat};
use tracing::{debug, instrument};

/// Reduce any decoded layout to the two the pipeline works with:
/// 8-bit single-channel or 8-bit RGB. Alpha is dropped.
pub fn normalize_channels(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => image,
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_) => {
            DynamicImage::ImageLuma8(image.to_luma8())
        }
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Decode encoded bytes (JPEG, PNG, ...) into a normalised image.
#[instrument(skip(data), fields(data_len = data.len()))]
pub fn decode(data: &[u8]) -> Result<DynamicImage> {
    if data.is_empty() {
        return Err(DocscanError::invalid("cannot decode an empty image buffer"));
    }
    let image = image::load_from_memory(data)
        .map_err(|err| DocscanError::invalid(format!("failed to decode image: {err}")))?;
    ensure_not_empty(&image)?;
    debug!(
        width = image.width(),
        height = image.height(),
        "Image decoded from bytes"
    );
    Ok(normalize_channels(image))
}

/// Load and decode an image file.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn open(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let data = std::fs::read(path.as_ref())?;
    decode(&data)
}

/// Fail with `InvalidInput` for zero-sized images.
pub fn ensure_not_empty(image: &DynamicImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(DocscanError::invalid(format!(
            "empty image ({}x{})",
            image.width(),
            image.height()
        )));
    }
    Ok(())
}

/// Encode as PNG bytes.
pub fn to_png_bytes(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|err| DocscanError::Encode(format!("PNG encoding failed: {err}")))?;
    Ok(buffer)
}

/// Encode as JPEG bytes with the given quality (1-100). Single-channel
/// images stay single-channel.
pub fn to_jpeg_bytes(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality);
    let result = match image {
        DynamicImage::ImageLuma8(gray) => gray.write_with_encoder(encoder),
        other => other.to_rgb8().write_with_encoder(encoder),
    };
    result.map_err(|err| DocscanError::Encode(format!("JPEG encoding failed: {err}")))?;
    Ok(buffer)
}

/// JPEG-encode and wrap in standard base64.
pub fn encode_base64_jpeg(image: &DynamicImage, quality: u8) -> Result<String> {
    Ok(STANDARD.encode(to_jpeg_bytes(image, quality)?))
}

/// Decode a base64 string (optionally a `data:` URL) into an image.
pub fn decode_base64_image(encoded: &str) -> Result<DynamicImage> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|err| DocscanError::invalid(format!("invalid base64 image: {err}")))?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn normalises_alpha_layouts() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 4])));
        assert!(matches!(normalize_channels(rgba), DynamicImage::ImageRgb8(_)));

        let gray = DynamicImage::ImageLuma8(GrayImage::new(2, 2));
        assert!(matches!(normalize_channels(gray), DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn png_bytes_decode_back() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(7, 3, Rgb([9, 80, 200])));
        let decoded = decode(&to_png_bytes(&img).unwrap()).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn jpeg_keeps_single_channel() {
        let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 16, Luma([128])));
        let decoded = decode(&to_jpeg_bytes(&gray, 90).unwrap()).unwrap();
        assert!(matches!(decoded, DynamicImage::ImageLuma8(_)));
        assert_eq!((decoded.width(), decoded.height()), (16, 16));
    }

    #[test]
    fn garbage_bytes_are_invalid_input() {
        assert!(matches!(decode(b"not an image"), Err(DocscanError::InvalidInput(_))));
        assert!(matches!(decode(&[]), Err(DocscanError::InvalidInput(_))));
    }

    #[test]
    fn base64_accepts_data_urls() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])));
        let encoded = encode_base64_jpeg(&img, 95).unwrap();

        let plain = decode_base64_image(&encoded).unwrap();
        let url = decode_base64_image(&format!("data:image/jpeg;base64,{encoded}")).unwrap();
        assert_eq!((plain.width(), plain.height()), (8, 8));
        assert_eq!(plain, url);

        assert!(decode_base64_image("***").is_err());
    }
}
