// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — wrap a rectified page in a single-page PDF using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`.

use docscan_core::error::Result;
use image::DynamicImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, info, instrument};

use crate::image::codec::ensure_not_empty;

/// One image pixel is placed as one PDF point.
const POINTS_PER_INCH: f32 = 72.0;

/// Creates single-page PDFs from raster pages.
///
/// The page is exactly the image size, with one pixel mapped to one point,
/// so a 600x800 scan becomes a 600pt x 800pt page.
pub struct PdfWriter {
    /// Title metadata embedded in the PDF /Info dictionary.
    title: String,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new("Scanned Document")
    }
}

impl PdfWriter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    // -- Image to PDF ---------------------------------------------------------

    /// Create a single-page PDF holding `image` edge to edge.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn create_from_image(&self, image: &DynamicImage) -> Result<Vec<u8>> {
        ensure_not_empty(image)?;
        info!(title = %self.title, "Creating image PDF");

        let (width, height) = (image.width() as usize, image.height() as usize);
        let raw = match image {
            DynamicImage::ImageLuma8(gray) => RawImage {
                pixels: RawImageData::U8(gray.as_raw().clone()),
                width,
                height,
                data_format: RawImageFormat::R8,
                tag: Vec::new(),
            },
            other => RawImage {
                pixels: RawImageData::U8(other.to_rgb8().into_raw()),
                width,
                height,
                data_format: RawImageFormat::RGB8,
                tag: Vec::new(),
            },
        };

        let mut doc = PdfDocument::new(&self.title);
        let xobject_id = doc.add_image(&raw);

        let page_w = Pt(width as f32);
        let page_h = Pt(height as f32);

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(0.0)),
                translate_y: Some(Pt(0.0)),
                scale_x: Some(1.0),
                scale_y: Some(1.0),
                dpi: Some(POINTS_PER_INCH),
                rotate: None,
            },
        }];

        let page = PdfPage::new(pt_to_mm(page_w), pt_to_mm(page_h), ops);
        doc.with_pages(vec![page]);

        debug!(page_w_pt = page_w.0, page_h_pt = page_h.0, "Image placed on page");

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = doc.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(bytes = output.len(), warnings = warnings.len(), "PDF serialised");

        Ok(output)
    }
}

fn pt_to_mm(pt: Pt) -> Mm {
    Mm(pt.0 * 25.4 / POINTS_PER_INCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use lopdf::{Document, Object};

    fn number(obj: &Object) -> f32 {
        match obj {
            Object::Integer(i) => *i as f32,
            Object::Real(r) => *r as f32,
            other => panic!("expected a number, got {other:?}"),
        }
    }

    /// Parse the PDF and return (page count, first page MediaBox size).
    fn inspect(bytes: &[u8]) -> (usize, f32, f32) {
        let doc = Document::load_mem(bytes).expect("writer output should parse");
        let pages = doc.get_pages();
        let first = *pages.values().next().expect("at least one page");
        let page = doc.get_dictionary(first).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let w = number(&media_box[2]) - number(&media_box[0]);
        let h = number(&media_box[3]) - number(&media_box[1]);
        (pages.len(), w, h)
    }

    #[test]
    fn page_matches_image_size() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 420, Rgb([250, 250, 250])));
        let bytes = PdfWriter::default().create_from_image(&img).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        let (pages, w, h) = inspect(&bytes);
        assert_eq!(pages, 1);
        assert!((w - 300.0).abs() < 1.0, "page width {w}");
        assert!((h - 420.0).abs() < 1.0, "page height {h}");
    }

    #[test]
    fn grayscale_pages_are_accepted() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 32, Luma([0])));
        let bytes = PdfWriter::new("Receipt").create_from_image(&img).unwrap();
        let (pages, w, h) = inspect(&bytes);
        assert_eq!(pages, 1);
        assert!((w - 64.0).abs() < 1.0 && (h - 32.0).abs() < 1.0);
    }

    #[test]
    fn empty_image_is_rejected() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(0, 5));
        assert!(PdfWriter::default().create_from_image(&img).is_err());
    }
}
