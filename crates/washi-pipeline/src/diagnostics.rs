//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! These diagnostics are permanent instrumentation intended for
//! algorithm tuning and parameter experimentation. The
//! `*_with_diagnostics` entry points in the crate root collect them
//! alongside the pipeline results.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
///
/// Each variant captures the counts and sizes meaningful for that
/// particular processing step; the scan and unmark pipelines share the
/// decode variant and otherwise use their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Image decoding metrics.
    Decode {
        /// Size of the input image bytes.
        input_bytes: usize,
        /// Decoded image width in pixels.
        width: u32,
        /// Decoded image height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
    },
    /// Working-copy resize metrics.
    Resize {
        /// Original image height in pixels.
        from_height: u32,
        /// Working image height in pixels.
        to_height: u32,
        /// Scale ratio back to the original (`from / to`).
        ratio: f32,
    },
    /// Grayscale conversion metrics.
    Grayscale {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Gaussian blur metrics.
    Blur {
        /// Sigma value used for the blur kernel.
        sigma: f32,
    },
    /// Canny edge detection metrics.
    EdgeDetection {
        /// Low threshold (after clamping).
        low_threshold: f32,
        /// High threshold (after clamping).
        high_threshold: f32,
        /// Number of edge pixels (value == 255) in the output.
        edge_pixel_count: u64,
        /// Total pixel count for computing edge density.
        total_pixel_count: u64,
    },
    /// Paper quadrilateral selection metrics.
    QuadSelection {
        /// How many of the largest contours were examined.
        max_candidates: usize,
        /// Polygon approximation tolerance as a fraction of perimeter.
        epsilon_frac: f64,
    },
    /// Perspective rectification metrics.
    Rectify {
        /// Rectified output width in pixels.
        width: u32,
        /// Rectified output height in pixels.
        height: u32,
    },
    /// Adaptive threshold metrics.
    Binarize {
        /// Neighborhood radius (window is `2r + 1` square).
        block_radius: u32,
        /// Brightness offset subtracted from the local mean.
        offset: u8,
        /// Number of white pixels in the output.
        white_pixel_count: u64,
        /// Total pixel count for computing ink density.
        total_pixel_count: u64,
    },
    /// Saturation extraction metrics.
    Saturation {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Letter mask construction metrics.
    LetterMask {
        /// Saturation cutoff for the initial mask.
        saturation_threshold: u8,
        /// Minimum component population to survive filtering.
        population_threshold: u32,
        /// Connected components found (before filtering, excluding
        /// background).
        component_count: usize,
        /// Pixels in the filtered letter mask.
        mask_pixel_count: u64,
    },
    /// Morphological region mask metrics.
    RegionMasks {
        /// Pixels in the eroded inner mask.
        inner_pixel_count: u64,
        /// Pixels in the dilated outer mask.
        outer_pixel_count: u64,
        /// Pixels in the boundary edge mask.
        edge_pixel_count: u64,
    },
    /// Histogram matching metrics.
    HistogramMatch {
        /// Nonzero pixels in the matched region.
        source_pixel_count: u64,
        /// Nonzero pixels in the reference region.
        template_pixel_count: u64,
    },
    /// Inpainting metrics.
    Inpaint {
        /// Neighborhood radius in pixels.
        radius: u32,
        /// Hole pixels filled in the hue and saturation planes.
        outer_hole_pixel_count: u64,
        /// Hole pixels filled in the value plane.
        edge_hole_pixel_count: u64,
    },
}

/// Diagnostics collected from a single scan pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanDiagnostics {
    /// Stage 0: image decoding.
    pub decode: StageDiagnostics,
    /// Stage 1: resize to the working height.
    pub resize: StageDiagnostics,
    /// Stage 2: grayscale conversion.
    pub grayscale: StageDiagnostics,
    /// Stage 3: Gaussian blur.
    pub blur: StageDiagnostics,
    /// Stage 4: Canny edge detection.
    pub edge_detection: StageDiagnostics,
    /// Stage 5: paper quadrilateral selection.
    pub quad_selection: StageDiagnostics,
    /// Stage 6: perspective rectification.
    pub rectify: StageDiagnostics,
    /// Stage 7: adaptive thresholding.
    pub binarize: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: ScanSummary,
}

/// High-level summary counts for a scan run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total source pixel count.
    pub pixel_count: u64,
    /// Rectified output width in pixels.
    pub output_width: u32,
    /// Rectified output height in pixels.
    pub output_height: u32,
}

/// Diagnostics collected from a single unmark pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnmarkDiagnostics {
    /// Stage 0: image decoding.
    pub decode: StageDiagnostics,
    /// Stage 1: saturation plane extraction.
    pub saturation: StageDiagnostics,
    /// Stage 2: letter mask via thresholding and component filtering.
    pub letter_mask: StageDiagnostics,
    /// Stage 3: inner/outer/edge region masks.
    pub region_masks: StageDiagnostics,
    /// Stage 4: brightness histogram matching.
    pub histogram_match: StageDiagnostics,
    /// Stage 5: inpainting over the mask regions.
    pub inpaint: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: UnmarkSummary,
}

/// High-level summary counts for an unmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnmarkSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Connected components found in the low-saturation mask.
    pub component_count: usize,
    /// Pixels in the filtered letter mask.
    pub letter_pixel_count: u64,
}

impl ScanDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let stages = [
            ("Decode", &self.decode),
            ("Resize", &self.resize),
            ("Grayscale", &self.grayscale),
            ("Blur", &self.blur),
            ("Edge Detection", &self.edge_detection),
            ("Quad Selection", &self.quad_selection),
            ("Rectify", &self.rectify),
            ("Binarize", &self.binarize),
        ];
        let mut lines = report_header(
            "Scan Diagnostics Report",
            self.summary.image_width,
            self.summary.image_height,
            self.summary.pixel_count,
            self.total_duration,
        );
        report_stages(&mut lines, &stages, self.total_duration);
        lines.push(String::new());
        lines.push(format!(
            "Output: {}x{}",
            self.summary.output_width, self.summary.output_height,
        ));
        lines.join("\n")
    }
}

impl UnmarkDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let stages = [
            ("Decode", &self.decode),
            ("Saturation", &self.saturation),
            ("Letter Mask", &self.letter_mask),
            ("Region Masks", &self.region_masks),
            ("Histogram Match", &self.histogram_match),
            ("Inpaint", &self.inpaint),
        ];
        let mut lines = report_header(
            "Unmark Diagnostics Report",
            self.summary.image_width,
            self.summary.image_height,
            self.summary.pixel_count,
            self.total_duration,
        );
        report_stages(&mut lines, &stages, self.total_duration);
        lines.push(String::new());
        lines.push(format!(
            "Components: {}  |  Letter pixels: {}",
            self.summary.component_count, self.summary.letter_pixel_count,
        ));
        lines.join("\n")
    }
}

/// Shared report preamble: title, image dimensions, total duration,
/// and the stage table header.
fn report_header(
    title: &str,
    width: u32,
    height: u32,
    pixel_count: u64,
    total: Duration,
) -> Vec<String> {
    vec![
        format!("{title}\n{}", "=".repeat(60)),
        format!("Image: {width}x{height} ({pixel_count} pixels)"),
        format!("Total duration: {:.3}ms", duration_ms(total)),
        String::new(),
        format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ),
        "-".repeat(80),
    ]
}

/// Append one table row per stage.
fn report_stages(lines: &mut Vec<String>, stages: &[(&str, &StageDiagnostics)], total: Duration) {
    let total_ms = duration_ms(total);
    for (name, diag) in stages {
        let ms = duration_ms(diag.duration);
        let pct = if total_ms > 0.0 {
            ms / total_ms * 100.0
        } else {
            0.0
        };
        let details = format_metrics(&diag.metrics);
        lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
#[allow(clippy::cast_precision_loss)]
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Decode {
            input_bytes,
            width,
            height,
            ..
        } => {
            format!("{input_bytes} bytes -> {width}x{height}")
        }
        StageMetrics::Resize {
            from_height,
            to_height,
            ratio,
        } => {
            format!("h={from_height}->{to_height} (ratio {ratio:.3})")
        }
        StageMetrics::Grayscale { width, height } | StageMetrics::Saturation { width, height } => {
            format!("{width}x{height}")
        }
        StageMetrics::Blur { sigma } => format!("sigma={sigma:.2}"),
        StageMetrics::EdgeDetection {
            low_threshold,
            high_threshold,
            edge_pixel_count,
            total_pixel_count,
        } => {
            let density = if *total_pixel_count > 0 {
                *edge_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!(
                "low={low_threshold:.1} high={high_threshold:.1} edges={edge_pixel_count} ({density:.1}%)",
            )
        }
        StageMetrics::QuadSelection {
            max_candidates,
            epsilon_frac,
        } => {
            format!("top {max_candidates} contours, eps={epsilon_frac:.3}")
        }
        StageMetrics::Rectify { width, height } => format!("-> {width}x{height}"),
        StageMetrics::Binarize {
            block_radius,
            offset,
            white_pixel_count,
            total_pixel_count,
        } => {
            let white = if *total_pixel_count > 0 {
                *white_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!("r={block_radius} offset={offset} white={white:.1}%")
        }
        StageMetrics::LetterMask {
            saturation_threshold,
            population_threshold,
            component_count,
            mask_pixel_count,
        } => {
            format!(
                "sat<={saturation_threshold} pop>={population_threshold} {component_count} components, {mask_pixel_count} px",
            )
        }
        StageMetrics::RegionMasks {
            inner_pixel_count,
            outer_pixel_count,
            edge_pixel_count,
        } => {
            format!(
                "inner={inner_pixel_count} outer={outer_pixel_count} edge={edge_pixel_count}",
            )
        }
        StageMetrics::HistogramMatch {
            source_pixel_count,
            template_pixel_count,
        } => {
            format!("{source_pixel_count} px vs {template_pixel_count} px reference")
        }
        StageMetrics::Inpaint {
            radius,
            outer_hole_pixel_count,
            edge_hole_pixel_count,
        } => {
            format!(
                "r={radius} holes: outer={outer_hole_pixel_count} edge={edge_hole_pixel_count}",
            )
        }
    }
}

/// Count nonzero pixels in a grayscale image.
pub(crate) fn count_nonzero_pixels(image: &image::GrayImage) -> u64 {
    image
        .pixels()
        .map(|p| u64::from(u8::from(p.0[0] > 0)))
        .sum()
}
