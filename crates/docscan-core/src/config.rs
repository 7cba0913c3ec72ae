// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline configuration, persisted as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DocscanError, Result};

/// Top-level settings for a scan session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub detection: DetectionConfig,
    pub export: ExportConfig,
    pub capture: CaptureConfig,
}

/// Tuning for document boundary detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Images taller than this are downscaled before edge detection.
    pub working_height: u32,
    /// Gaussian kernel size applied before edge detection (odd).
    pub blur_kernel: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Square structuring element size for dilation and closing (odd).
    pub morph_kernel: u32,
    /// Polygon approximation tolerance as a fraction of contour perimeter.
    pub approx_epsilon_ratio: f64,
    /// RGB colour of the preview outline.
    pub overlay_color: [u8; 3],
    /// Preview outline thickness in pixels.
    pub overlay_width: u32,
    /// Skip non-convex four-vertex candidates.
    pub require_convex: bool,
    /// Centre the accepted outline on the dilated edge band.
    pub refine_edge_band: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            working_height: 500,
            blur_kernel: 5,
            canny_low: 50.0,
            canny_high: 150.0,
            morph_kernel: 5,
            approx_epsilon_ratio: 0.02,
            overlay_color: [255, 255, 0],
            overlay_width: 3,
            require_convex: false,
            refine_edge_band: true,
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<()> {
        if self.working_height == 0 {
            return Err(DocscanError::Config("working_height must be positive".into()));
        }
        if self.blur_kernel == 0 || self.blur_kernel % 2 == 0 {
            return Err(DocscanError::Config(format!(
                "blur_kernel must be a positive odd size, got {}",
                self.blur_kernel
            )));
        }
        if self.morph_kernel == 0 || self.morph_kernel % 2 == 0 || self.morph_kernel > 511 {
            return Err(DocscanError::Config(format!(
                "morph_kernel must be a positive odd size, got {}",
                self.morph_kernel
            )));
        }
        if !(self.canny_low >= 0.0 && self.canny_low < self.canny_high) {
            return Err(DocscanError::Config(format!(
                "canny thresholds must satisfy 0 <= low < high, got {} / {}",
                self.canny_low, self.canny_high
            )));
        }
        if !(self.approx_epsilon_ratio > 0.0 && self.approx_epsilon_ratio < 1.0) {
            return Err(DocscanError::Config(format!(
                "approx_epsilon_ratio must be in (0, 1), got {}",
                self.approx_epsilon_ratio
            )));
        }
        Ok(())
    }
}

/// Output encoding settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// JPEG quality (1-100).
    pub jpeg_quality: u8,
    /// Title metadata for exported PDFs.
    pub pdf_title: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 95,
            pdf_title: "Scanned Document".into(),
        }
    }
}

/// Image source settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Timeout for remote camera snapshots, in seconds.
    pub timeout_secs: u64,
    /// File extensions accepted for uploads (lowercase, without the dot).
    pub allowed_extensions: Vec<String>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            allowed_extensions: vec!["png".into(), "jpg".into(), "jpeg".into()],
        }
    }
}

impl ScanConfig {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Write settings as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.detection.validate()?;
        if !(1..=100).contains(&self.export.jpeg_quality) {
            return Err(DocscanError::Config(format!(
                "jpeg_quality must be 1-100, got {}",
                self.export.jpeg_quality
            )));
        }
        if self.capture.timeout_secs == 0 {
            return Err(DocscanError::Config("capture timeout must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.detection.working_height, 500);
        assert_eq!(config.capture.timeout_secs, 5);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ScanConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ScanConfig::default();
        config.detection.require_convex = true;
        config.export.jpeg_quality = 80;
        config.save(&path).unwrap();

        assert_eq!(ScanConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "detection": { "canny_low": 30.0 } }"#).unwrap();

        let config = ScanConfig::load(&path).unwrap();
        assert_eq!(config.detection.canny_low, 30.0);
        assert_eq!(config.detection.canny_high, 150.0);
        assert_eq!(config.export, ExportConfig::default());
    }

    #[test]
    fn rejects_even_kernel() {
        let detection = DetectionConfig {
            morph_kernel: 4,
            ..Default::default()
        };
        assert!(matches!(detection.validate(), Err(DocscanError::Config(_))));
    }

    #[test]
    fn rejects_inverted_canny_thresholds() {
        let detection = DetectionConfig {
            canny_low: 200.0,
            canny_high: 100.0,
            ..Default::default()
        };
        assert!(detection.validate().is_err());
    }
}
