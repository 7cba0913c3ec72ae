// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan pipeline — detect → rectify → adjust → export, with no session state.

use docscan_core::error::Result;
use docscan_core::{AdjustmentParams, Detection, ExportFormat, Quadrilateral, ScanConfig};
use image::DynamicImage;
use tracing::{info, instrument, warn};

use crate::image::adjust::ImageAdjuster;
use crate::image::codec;
use crate::pdf::writer::PdfWriter;
use crate::scan::detect::{BoundaryDetector, DetectionResult};
use crate::scan::rectify::Rectifier;

/// Everything produced by one pass over a photograph.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// The photograph with the detected outline drawn, or unchanged.
    pub preview: DynamicImage,
    pub detection: Detection,
    /// The corners actually used for rectification (manual or detected).
    pub corners: Option<Quadrilateral>,
    /// The top-down page, before adjustment. `None` when there were no corners.
    pub rectified: Option<DynamicImage>,
    /// The final adjusted page.
    pub output: DynamicImage,
}

/// Wires the stages together. Holds configuration only; every call is
/// independent.
pub struct ScanPipeline {
    detector: BoundaryDetector,
    rectifier: Rectifier,
    pdf: PdfWriter,
    jpeg_quality: u8,
}

impl ScanPipeline {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            detector: BoundaryDetector::new(config.detection.clone())?,
            rectifier: Rectifier::new(),
            pdf: PdfWriter::new(config.export.pdf_title.clone()),
            jpeg_quality: config.export.jpeg_quality,
        })
    }

    pub fn detect(&self, image: &DynamicImage) -> Result<DetectionResult> {
        self.detector.detect(image)
    }

    pub fn rectify(&self, image: &DynamicImage, quad: &Quadrilateral) -> Result<DynamicImage> {
        self.rectifier.rectify(image, quad)
    }

    pub fn adjust(&self, image: DynamicImage, params: &AdjustmentParams) -> Result<DynamicImage> {
        Ok(ImageAdjuster::from_dynamic(image).apply(params)?.into_dynamic())
    }

    /// Run the whole flow on one photograph.
    ///
    /// Detection always runs so a preview is available. `manual` corners,
    /// when given, override whatever was detected. With no corners at all
    /// the photograph itself is adjusted.
    #[instrument(skip_all, fields(manual = manual.is_some()))]
    pub fn process(
        &self,
        image: &DynamicImage,
        manual: Option<&Quadrilateral>,
        params: &AdjustmentParams,
    ) -> Result<ScanOutcome> {
        params.validate()?;
        let DetectionResult { preview, detection } = self.detect(image)?;

        let corners = manual.copied().or_else(|| detection.quadrilateral().copied());
        let rectified = match &corners {
            Some(quad) => Some(self.rectify(image, quad)?),
            None => {
                warn!("No corners available; adjusting the photograph as-is");
                None
            }
        };

        let base = rectified.clone().unwrap_or_else(|| image.clone());
        let output = self.adjust(base, params)?;
        info!(
            found = detection.is_found(),
            width = output.width(),
            height = output.height(),
            "Scan processed"
        );

        Ok(ScanOutcome {
            preview,
            detection,
            corners,
            rectified,
            output,
        })
    }

    /// Encode a finished page.
    pub fn export(&self, image: &DynamicImage, format: ExportFormat) -> Result<Vec<u8>> {
        match format {
            ExportFormat::Jpeg => codec::to_jpeg_bytes(image, self.jpeg_quality),
            ExportFormat::Png => codec::to_png_bytes(image),
            ExportFormat::Pdf => self.pdf.create_from_image(image),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docscan_core::{FilterMode, Point2D};
    use image::{GenericImageView, GrayImage, Luma, Rgb, RgbImage};
    use imageproc::drawing::draw_polygon_mut;
    use imageproc::point::Point;

    fn page_photo() -> DynamicImage {
        let mut canvas = RgbImage::from_pixel(400, 300, Rgb([20, 20, 20]));
        let outline = [
            Point::new(60, 40),
            Point::new(340, 50),
            Point::new(330, 260),
            Point::new(70, 250),
        ];
        draw_polygon_mut(&mut canvas, &outline, Rgb([240, 240, 235]));
        DynamicImage::ImageRgb8(canvas)
    }

    fn pipeline() -> ScanPipeline {
        ScanPipeline::new(&ScanConfig::default()).unwrap()
    }

    #[test]
    fn detected_page_is_rectified_and_adjusted() {
        let params = AdjustmentParams {
            filter_mode: FilterMode::Grayscale,
            ..Default::default()
        };
        let outcome = pipeline().process(&page_photo(), None, &params).unwrap();

        assert!(outcome.detection.is_found());
        assert_eq!(outcome.corners.as_ref(), outcome.detection.quadrilateral());
        let rectified = outcome.rectified.as_ref().unwrap();
        assert_eq!(outcome.output.dimensions(), rectified.dimensions());
        assert!(matches!(outcome.output, DynamicImage::ImageLuma8(_)));
    }

    #[test]
    fn manual_corners_override_detection() {
        let manual = Quadrilateral::new([
            Point2D::new(10.0, 10.0),
            Point2D::new(110.0, 10.0),
            Point2D::new(110.0, 60.0),
            Point2D::new(10.0, 60.0),
        ])
        .unwrap();
        let outcome = pipeline()
            .process(&page_photo(), Some(&manual), &AdjustmentParams::default())
            .unwrap();
        assert_eq!(outcome.corners, Some(manual));
        assert_eq!(outcome.output.dimensions(), (100, 50));
    }

    #[test]
    fn nothing_found_adjusts_the_photo() {
        let photo = DynamicImage::ImageLuma8(GrayImage::from_pixel(80, 60, Luma([0])));
        let params = AdjustmentParams {
            rotation_degrees: 90,
            ..Default::default()
        };
        let outcome = pipeline().process(&photo, None, &params).unwrap();
        assert_eq!(outcome.detection, Detection::NotFound);
        assert_eq!(outcome.preview, photo);
        assert!(outcome.rectified.is_none());
        assert_eq!(outcome.output.dimensions(), (60, 80));
    }

    #[test]
    fn invalid_params_fail_before_work() {
        let params = AdjustmentParams {
            smooth_radius: 2,
            ..Default::default()
        };
        assert!(pipeline().process(&page_photo(), None, &params).is_err());
    }

    #[test]
    fn exports_every_format() {
        let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(32, 24, Rgb([200, 10, 10])));
        let p = pipeline();

        let jpeg = p.export(&page, ExportFormat::Jpeg).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

        let png = p.export(&page, ExportFormat::Png).unwrap();
        assert_eq!(codec::decode(&png).unwrap(), page);

        let pdf = p.export(&page, ExportFormat::Pdf).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }
}
