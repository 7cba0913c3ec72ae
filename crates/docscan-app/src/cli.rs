// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface definition.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use docscan_core::error::{DocscanError, Result};
use docscan_core::{AdjustmentParams, ExportFormat, FilterMode, Quadrilateral};

/// Turn photos of paper documents into clean, flat scans
#[derive(Parser, Debug)]
#[command(name = "docscan", version, about, long_about = None)]
pub struct Cli {
    /// Settings file (JSON). Defaults to the per-user config location.
    #[arg(long, global = true, env = "DOCSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log debug detail (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find the document outline in a photo
    Detect(DetectArgs),
    /// Flatten the region inside four corners
    Rectify(RectifyArgs),
    /// Rotate, filter, and tone-adjust an image
    Adjust(AdjustArgs),
    /// Detect, rectify, adjust, and export in one go
    Scan(ScanArgs),
    /// Write the default settings file
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Image file or camera snapshot URL
    pub input: String,

    /// Save the photo with the detected outline drawn on it
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Include the preview in the JSON output as base64 JPEG
    #[arg(long, requires = "json")]
    pub embed_preview: bool,
}

#[derive(Args, Debug)]
pub struct RectifyArgs {
    /// Image file or camera snapshot URL
    pub input: String,

    /// Corners as "x,y;x,y;x,y;x,y" or a JSON list of [x, y] pairs
    #[arg(long, value_parser = parse_corners)]
    pub corners: Quadrilateral,

    /// Output file (.jpg, .png or .pdf)
    #[arg(short, long)]
    pub output: PathBuf,
}

/// Adjustment flags shared by `adjust` and `scan`.
#[derive(Args, Debug, Clone)]
pub struct AdjustFlags {
    /// Colour treatment: color, gray, or bw
    #[arg(long, default_value = "color")]
    pub filter: FilterMode,

    /// Added to every channel
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub brightness: i32,

    /// Multiplies every channel
    #[arg(long, default_value_t = 1.0)]
    pub contrast: f32,

    /// Blur kernel size (0 or odd)
    #[arg(long, default_value_t = 0)]
    pub smooth: u32,

    /// Rotation in degrees: 90/180/270 turn clockwise losslessly, other
    /// angles turn counter-clockwise about the centre
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    pub rotate: i32,
}

impl AdjustFlags {
    pub fn params(&self) -> AdjustmentParams {
        AdjustmentParams {
            filter_mode: self.filter,
            brightness: self.brightness,
            contrast: self.contrast,
            smooth_radius: self.smooth,
            rotation_degrees: self.rotate,
        }
    }
}

#[derive(Args, Debug)]
pub struct AdjustArgs {
    /// Image file or camera snapshot URL
    pub input: String,

    #[command(flatten)]
    pub flags: AdjustFlags,

    /// Output file (.jpg, .png or .pdf)
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Image file or camera snapshot URL
    pub input: String,

    /// Use these corners instead of the detected outline
    #[arg(long, value_parser = parse_corners)]
    pub corners: Option<Quadrilateral>,

    #[command(flatten)]
    pub flags: AdjustFlags,

    /// Also save the detection preview
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// Output file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Output format (jpeg, png, pdf). Inferred from the output name if omitted.
    #[arg(long)]
    pub format: Option<ExportFormat>,
}

#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Replace an existing settings file
    #[arg(long)]
    pub force: bool,
}

/// Parse corners from `x,y;x,y;x,y;x,y` or `[[x,y],...]`.
pub fn parse_corners(input: &str) -> Result<Quadrilateral> {
    let trimmed = input.trim();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let pairs = trimmed
        .split(';')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            let (x, y) = part
                .split_once(',')
                .ok_or_else(|| DocscanError::invalid(format!("corner '{part}' is not x,y")))?;
            let coord = |s: &str| {
                s.trim()
                    .parse::<f64>()
                    .map_err(|_| DocscanError::invalid(format!("corner '{part}' is not x,y")))
            };
            Ok([coord(x)?, coord(y)?])
        })
        .collect::<Result<Vec<[f64; 2]>>>()?;
    Quadrilateral::from_pairs(&pairs)
}

/// The export format for `path`, from an explicit choice or the file
/// extension.
pub fn output_format(path: &Path, explicit: Option<ExportFormat>) -> Result<ExportFormat> {
    if let Some(format) = explicit {
        return Ok(format);
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| {
            DocscanError::UnsupportedFormat(format!(
                "cannot tell the format of '{}'; add .jpg, .png or .pdf",
                path.display()
            ))
        })?;
    ext.parse()
}
