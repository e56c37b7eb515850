//! washi-scan: CLI document scanner.
//!
//! Photographs a sheet of paper rarely arrive flat and straight-on.
//! This tool finds the paper's outline in the photo, warps it to a
//! top-down view, and thresholds it into a clean black-and-white scan,
//! printing per-stage diagnostics along the way. Useful for:
//!
//! - Producing a scan-like image from a phone photo
//! - Tuning Canny thresholds, blur sigma, and threshold offset
//! - Inspecting every intermediate stage via `--stages-dir`
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin washi-scan -- --image photo.jpg --output scan.png
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use washi_pipeline::{ScanConfig, StagedScan};

/// Document scanner: paper detection, rectification, binarization.
///
/// Runs the scan pipeline on a photo and writes the binarized result,
/// printing detailed per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "washi-scan", version)]
struct Cli {
    /// Path to the input photo (PNG, JPEG, BMP, WebP).
    #[arg(long)]
    image: PathBuf,

    /// Where to write the binarized scan.
    #[arg(long, default_value = "scanned.png")]
    output: PathBuf,

    /// Directory to dump every intermediate stage image into.
    #[arg(long)]
    stages_dir: Option<PathBuf>,

    /// Height the paper detector works at.
    #[arg(long, default_value_t = ScanConfig::DEFAULT_WORKING_HEIGHT, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    working_height: u32,

    /// Gaussian blur sigma.
    #[arg(long, default_value_t = ScanConfig::DEFAULT_BLUR_SIGMA)]
    blur_sigma: f32,

    /// Canny low threshold.
    #[arg(long, default_value_t = ScanConfig::DEFAULT_CANNY_LOW)]
    canny_low: f32,

    /// Canny high threshold.
    #[arg(long, default_value_t = ScanConfig::DEFAULT_CANNY_HIGH)]
    canny_high: f32,

    /// How many of the largest contours to examine for the paper.
    #[arg(long, default_value_t = ScanConfig::DEFAULT_MAX_CANDIDATES, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    max_candidates: usize,

    /// Polygon approximation tolerance as a fraction of perimeter.
    #[arg(long, default_value_t = ScanConfig::DEFAULT_APPROX_EPSILON_FRAC)]
    approx_epsilon_frac: f64,

    /// Adaptive threshold neighborhood radius.
    #[arg(long, default_value_t = ScanConfig::DEFAULT_BLOCK_RADIUS)]
    block_radius: u32,

    /// Brightness offset subtracted from the local mean.
    #[arg(long, default_value_t = ScanConfig::DEFAULT_THRESHOLD_OFFSET)]
    threshold_offset: u8,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full scan config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `ScanConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Build a [`ScanConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.  Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<ScanConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(ScanConfig {
        working_height: cli.working_height,
        blur_sigma: cli.blur_sigma,
        canny_low: cli.canny_low,
        canny_high: cli.canny_high,
        max_candidates: cli.max_candidates,
        approx_epsilon_frac: cli.approx_epsilon_frac,
        block_radius: cli.block_radius,
        threshold_offset: cli.threshold_offset,
    })
}

/// Dump every intermediate stage image plus the detected corners.
fn write_stages(staged: &StagedScan, dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(dir)
        .map_err(|e| format!("Error creating {}: {e}", dir.display()))?;

    let p = dir.join("original.png");
    saved(&p, staged.original.save(&p))?;
    let p = dir.join("working.png");
    saved(&p, staged.working.save(&p))?;
    let p = dir.join("grayscale.png");
    saved(&p, staged.grayscale.save(&p))?;
    let p = dir.join("blurred.png");
    saved(&p, staged.blurred.save(&p))?;
    let p = dir.join("edges.png");
    saved(&p, staged.edges.save(&p))?;
    let p = dir.join("rectified.png");
    saved(&p, staged.rectified.save(&p))?;
    let p = dir.join("binarized.png");
    saved(&p, staged.binarized.save(&p))?;

    let corners = serde_json::to_string_pretty(&staged.corners)
        .map_err(|e| format!("Error serializing corners: {e}"))?;
    let path = dir.join("corners.json");
    std::fs::write(&path, corners).map_err(|e| format!("Error writing {}: {e}", path.display()))
}

/// Attach the destination path to a stage save error.
fn saved<E: std::fmt::Display>(path: &Path, result: Result<(), E>) -> Result<(), String> {
    result.map_err(|e| format!("Error writing {}: {e}", path.display()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Image: {} ({} bytes)", cli.image.display(), image_bytes.len());
    eprintln!("Config: {config:#?}");
    eprintln!();

    let (staged, diagnostics) =
        match washi_pipeline::scan_staged_with_diagnostics(&image_bytes, &config) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        };

    if cli.json {
        match serde_json::to_string_pretty(&diagnostics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", diagnostics.report());
    }

    if let Err(e) = staged.binarized.save(&cli.output) {
        eprintln!("Error writing {}: {e}", cli.output.display());
        return ExitCode::FAILURE;
    }
    eprintln!("Scan written to {}", cli.output.display());

    if let Some(ref dir) = cli.stages_dir {
        if let Err(msg) = write_stages(&staged, dir) {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
        eprintln!("Stage images written to {}", dir.display());
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use washi_pipeline::{Corners, GrayImage, Point, RgbImage};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("washi-scan").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_the_pipeline_config() {
        let cli = parse(&["--image", "photo.jpg"]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&[
            "--image",
            "photo.jpg",
            "--canny-low",
            "50",
            "--block-radius",
            "7",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert!((config.canny_low - 50.0).abs() < f32::EPSILON);
        assert_eq!(config.block_radius, 7);
        assert!((config.canny_high - ScanConfig::DEFAULT_CANNY_HIGH).abs() < f32::EPSILON);
    }

    #[test]
    fn config_json_overrides_flags() {
        let json = serde_json::to_string(&ScanConfig {
            canny_low: 10.0,
            ..ScanConfig::default()
        })
        .unwrap();
        let cli = parse(&["--image", "photo.jpg", "--canny-low", "99", "--config-json", &json]);
        let config = config_from_cli(&cli).unwrap();
        assert!((config.canny_low - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn bad_config_json_is_an_error() {
        let cli = parse(&["--image", "photo.jpg", "--config-json", "{nope"]);
        assert!(config_from_cli(&cli).is_err());
    }

    #[test]
    fn write_stages_creates_every_file() {
        let staged = StagedScan {
            original: RgbImage::new(8, 8),
            working: RgbImage::new(8, 8),
            grayscale: GrayImage::new(8, 8),
            blurred: GrayImage::new(8, 8),
            edges: GrayImage::new(8, 8),
            corners: Corners {
                top_left: Point::new(0.0, 0.0),
                top_right: Point::new(7.0, 0.0),
                bottom_right: Point::new(7.0, 7.0),
                bottom_left: Point::new(0.0, 7.0),
            },
            rectified: RgbImage::new(8, 8),
            binarized: GrayImage::new(8, 8),
        };

        let dir = tempfile::tempdir().unwrap();
        let stages = dir.path().join("stages");
        write_stages(&staged, &stages).unwrap();

        for name in [
            "original.png",
            "working.png",
            "grayscale.png",
            "blurred.png",
            "edges.png",
            "rectified.png",
            "binarized.png",
            "corners.json",
        ] {
            assert!(stages.join(name).exists(), "missing stage file {name}");
        }
    }
}
