// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Subcommand handlers. Each loads its input, runs one pipeline operation, and
// writes the result.

use std::path::Path;

use docscan_capture::ImageSource;
use docscan_core::error::{DocscanError, Result};
use docscan_core::{Detection, ExportFormat, ScanConfig};
use docscan_document::ScanPipeline;
use docscan_document::image::codec::encode_base64_jpeg;
use image::DynamicImage;
use tracing::{info, instrument};

use crate::cli::{
    AdjustArgs, Cli, Commands, DetectArgs, InitConfigArgs, RectifyArgs, ScanArgs, output_format,
};
use crate::services::data_dir;

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.unwrap_or_else(data_dir::default_config_path);

    if let Commands::InitConfig(args) = &cli.command {
        return init_config(&config_path, args);
    }

    let config = ScanConfig::load(&config_path)?;
    let pipeline = ScanPipeline::new(&config)?;

    match cli.command {
        Commands::Detect(args) => detect(&pipeline, &config, args).await,
        Commands::Rectify(args) => rectify(&pipeline, &config, args).await,
        Commands::Adjust(args) => adjust(&pipeline, &config, args).await,
        Commands::Scan(args) => scan(&pipeline, &config, args).await,
        Commands::InitConfig(_) => Ok(()),
    }
}

async fn load(input: &str, config: &ScanConfig) -> Result<DynamicImage> {
    ImageSource::parse(input).load(&config.capture).await
}

fn save(pipeline: &ScanPipeline, image: &DynamicImage, path: &Path, format: ExportFormat) -> Result<()> {
    let bytes = pipeline.export(image, format)?;
    std::fs::write(path, &bytes)?;
    info!(path = %path.display(), format = format.extension(), bytes = bytes.len(), "Wrote output");
    Ok(())
}

#[instrument(skip_all, fields(input = %args.input))]
async fn detect(pipeline: &ScanPipeline, config: &ScanConfig, args: DetectArgs) -> Result<()> {
    let image = load(&args.input, config).await?;
    let result = pipeline.detect(&image)?;

    if let Some(path) = &args.preview {
        save(pipeline, &result.preview, path, output_format(path, None)?)?;
    }

    let corners = result.detection.quadrilateral().map(|q| q.to_pairs());
    if args.json {
        let mut report = serde_json::json!({
            "found": result.detection.is_found(),
            "corners": corners,
        });
        if args.embed_preview {
            let preview = encode_base64_jpeg(&result.preview, config.export.jpeg_quality)?;
            report["preview"] = preview.into();
        }
        println!("{report}");
    } else {
        match corners {
            Some(pairs) => {
                let text: Vec<String> = pairs.iter().map(|[x, y]| format!("{x:.1},{y:.1}")).collect();
                println!("{}", text.join(";"));
            }
            None => println!("no document found"),
        }
    }
    Ok(())
}

#[instrument(skip_all, fields(input = %args.input))]
async fn rectify(pipeline: &ScanPipeline, config: &ScanConfig, args: RectifyArgs) -> Result<()> {
    let format = output_format(&args.output, None)?;
    let image = load(&args.input, config).await?;
    let page = pipeline.rectify(&image, &args.corners)?;
    save(pipeline, &page, &args.output, format)
}

#[instrument(skip_all, fields(input = %args.input))]
async fn adjust(pipeline: &ScanPipeline, config: &ScanConfig, args: AdjustArgs) -> Result<()> {
    let format = output_format(&args.output, None)?;
    let image = load(&args.input, config).await?;
    let page = pipeline.adjust(image, &args.flags.params())?;
    save(pipeline, &page, &args.output, format)
}

#[instrument(skip_all, fields(input = %args.input))]
async fn scan(pipeline: &ScanPipeline, config: &ScanConfig, args: ScanArgs) -> Result<()> {
    let format = output_format(&args.output, args.format)?;
    let image = load(&args.input, config).await?;
    let outcome = pipeline.process(&image, args.corners.as_ref(), &args.flags.params())?;

    if let Some(path) = &args.preview {
        save(pipeline, &outcome.preview, path, output_format(path, None)?)?;
    }
    if outcome.detection == Detection::NotFound && args.corners.is_none() {
        println!("no document found; saved the adjusted photo instead");
    }
    save(pipeline, &outcome.output, &args.output, format)
}

fn init_config(path: &Path, args: &InitConfigArgs) -> Result<()> {
    if path.exists() && !args.force {
        return Err(DocscanError::Config(format!(
            "settings file already exists at {} (use --force to replace it)",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    ScanConfig::default().save(path)?;
    println!("wrote default settings to {}", path.display());
    Ok(())
}
