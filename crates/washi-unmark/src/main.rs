//! washi-unmark: CLI watermark and stamp remover.
//!
//! Erases a gray (low-saturation) stamp from a colorful image by
//! balancing its brightness against the surroundings and inpainting
//! the seams, writing every intermediate stage image to the output
//! directory so each step of the repair can be inspected. Useful for:
//!
//! - Removing date stamps and watermarks from photos
//! - Tuning saturation and component population thresholds
//! - Watching how each mask and balancing step shapes the repair
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin washi-unmark -- photo.jpg --out-dir output
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use washi_pipeline::{InpainterKind, StagedUnmark, UnmarkConfig};

/// Watermark remover: mask the stamp, balance it, inpaint the seams.
///
/// Runs the unmark pipeline on an image and writes every intermediate
/// stage into the output directory, printing detailed per-stage timing
/// and count diagnostics.
#[derive(Parser)]
#[command(name = "washi-unmark", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    input: PathBuf,

    /// Directory for the stage images; created if missing.
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,

    /// Saturation level at or below which a pixel can belong to the
    /// stamp.
    #[arg(long, default_value_t = UnmarkConfig::DEFAULT_SATURATION_THRESHOLD)]
    saturation_threshold: u8,

    /// Minimum connected-component population for a stamp stroke.
    #[arg(long, default_value_t = UnmarkConfig::DEFAULT_POPULATION_THRESHOLD)]
    population_threshold: u32,

    /// Inpainting neighborhood radius in pixels.
    #[arg(long, default_value_t = UnmarkConfig::DEFAULT_INPAINT_RADIUS, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    inpaint_radius: u32,

    /// Inpainting algorithm.
    #[arg(long, value_enum, default_value_t = Filler::FastMarching)]
    inpainter: Filler,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full unmark config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `UnmarkConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Inpainting algorithm selection.
#[derive(Clone, Copy, ValueEnum)]
enum Filler {
    /// Telea fast-marching method.
    FastMarching,
}

/// Build an [`UnmarkConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.  Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<UnmarkConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(UnmarkConfig {
        saturation_threshold: cli.saturation_threshold,
        population_threshold: cli.population_threshold,
        inpaint_radius: cli.inpaint_radius,
        inpainter: match cli.inpainter {
            Filler::FastMarching => InpainterKind::FastMarching,
        },
    })
}

/// Write every pipeline stage under its stage name.
fn write_stages(staged: &StagedUnmark, dir: &Path) -> Result<(), String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("Error creating {}: {e}", dir.display()))?;

    let p = dir.join("image.jpg");
    saved(&p, staged.original.save(&p))?;
    let p = dir.join("image_saturation.jpg");
    saved(&p, staged.saturation.save(&p))?;
    let p = dir.join("big_blob_coloured_image.jpg");
    saved(&p, staged.big_blob_colored.save(&p))?;
    let p = dir.join("all_blob_coloured_image.jpg");
    saved(&p, staged.all_blob_colored.save(&p))?;
    let p = dir.join("edge_mask.jpg");
    saved(&p, staged.edge_mask.save(&p))?;
    let p = dir.join("inner_image.jpg");
    saved(&p, staged.inner_image.save(&p))?;
    let p = dir.join("outer_image.jpg");
    saved(&p, staged.outer_image.save(&p))?;
    let p = dir.join("balanced_inner_image.jpg");
    saved(&p, staged.balanced_inner.save(&p))?;
    let p = dir.join("before_filling_in.jpg");
    saved(&p, staged.composited.save(&p))?;
    let p = dir.join("after_filling_in.jpg");
    saved(&p, staged.result.save(&p))
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

    let image_bytes = match std::fs::read(&cli.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Image: {} ({} bytes)", cli.input.display(), image_bytes.len());
    eprintln!("Config: {config:#?}");
    eprintln!();

    let (staged, diagnostics) =
        match washi_pipeline::unmark_staged_with_diagnostics(&image_bytes, &config) {
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

    if let Err(msg) = write_stages(&staged, &cli.out_dir) {
        eprintln!("{msg}");
        return ExitCode::FAILURE;
    }
    eprintln!("Stage images written to {}", cli.out_dir.display());

    ExitCode::SUCCESS
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use washi_pipeline::{GrayImage, RgbImage};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("washi-unmark").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_the_pipeline_config() {
        let cli = parse(&["photo.jpg"]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config, UnmarkConfig::default());
    }

    #[test]
    fn flags_override_defaults() {
        let cli = parse(&["photo.jpg", "--saturation-threshold", "60", "--inpaint-radius", "9"]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.saturation_threshold, 60);
        assert_eq!(config.inpaint_radius, 9);
        assert_eq!(
            config.population_threshold,
            UnmarkConfig::DEFAULT_POPULATION_THRESHOLD,
        );
    }

    #[test]
    fn config_json_overrides_flags() {
        let json = serde_json::to_string(&UnmarkConfig {
            population_threshold: 12,
            ..UnmarkConfig::default()
        })
        .unwrap();
        let cli = parse(&["photo.jpg", "--population-threshold", "999", "--config-json", &json]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.population_threshold, 12);
    }

    #[test]
    fn bad_config_json_is_an_error() {
        let cli = parse(&["photo.jpg", "--config-json", "{nope"]);
        assert!(config_from_cli(&cli).is_err());
    }

    #[test]
    fn write_stages_creates_every_file() {
        let gray = || GrayImage::new(8, 8);
        let rgb = || RgbImage::new(8, 8);
        let staged = StagedUnmark {
            original: rgb(),
            saturation: gray(),
            big_blob_colored: rgb(),
            all_blob_colored: rgb(),
            letter_mask: gray(),
            inner_mask: gray(),
            outer_mask: gray(),
            edge_mask: gray(),
            inner_image: rgb(),
            outer_image: rgb(),
            balanced_inner: rgb(),
            composited: rgb(),
            result: rgb(),
        };

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");
        write_stages(&staged, &out).unwrap();

        for name in [
            "image.jpg",
            "image_saturation.jpg",
            "big_blob_coloured_image.jpg",
            "all_blob_coloured_image.jpg",
            "edge_mask.jpg",
            "inner_image.jpg",
            "outer_image.jpg",
            "balanced_inner_image.jpg",
            "before_filling_in.jpg",
            "after_filling_in.jpg",
        ] {
            assert!(out.join(name).exists(), "missing stage file {name}");
        }
    }
}
