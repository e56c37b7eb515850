//! washi-pipeline: Pure document image processing (sans-IO).
//!
//! Two pipelines over in-memory images:
//!
//! * **Scan** ([`scan`]): locate a sheet of paper in a photo, rectify
//!   its perspective, and binarize it into a clean black-and-white
//!   scan. Stages: decode -> resize -> grayscale -> blur -> edge
//!   detection -> quad selection -> rectification -> adaptive
//!   threshold.
//! * **Unmark** ([`unmark`]): find a low-saturation stamp or
//!   watermark, brightness-balance it against its surroundings, and
//!   inpaint it away. Stages: decode -> saturation -> letter mask ->
//!   region masks -> histogram match -> composite -> inpaint.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns structured data. File reading and stage
//! dumps live in the `washi-scan` and `washi-unmark` binaries.

pub mod binarize;
pub mod blobs;
pub mod blur;
pub mod composite;
pub mod diagnostics;
pub mod edge;
pub mod grayscale;
pub mod histmatch;
pub mod hsv;
pub mod inpaint;
pub mod morphology;
pub mod quad;
pub mod rectify;
pub mod resize;
pub mod types;

pub use diagnostics::{ScanDiagnostics, StageDiagnostics, StageMetrics, UnmarkDiagnostics};
pub use inpaint::{Inpainter, InpainterKind};
pub use types::{
    Corners, GrayImage, PipelineError, Point, RgbImage, ScanConfig, ScanResult, StagedScan,
    StagedUnmark, UnmarkConfig,
};

use std::time::Instant;

use diagnostics::{ScanSummary, StageDiagnostics as Stage, UnmarkSummary, count_nonzero_pixels};

/// Run the scan pipeline and return only the final result.
///
/// Takes raw image bytes (PNG, JPEG, BMP, WebP) and a configuration,
/// then produces a [`ScanResult`] with the binarized scan and the
/// detected paper corners in original image coordinates.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty,
/// [`PipelineError::ImageDecode`] if the image format is unrecognized,
/// [`PipelineError::InvalidConfig`] for an unusable configuration,
/// [`PipelineError::NoQuadrilateral`] if no paper boundary is found,
/// and [`PipelineError::DegenerateQuad`] if the detected corners admit
/// no perspective transform.
pub fn scan(image_bytes: &[u8], config: &ScanConfig) -> Result<ScanResult, PipelineError> {
    let staged = scan_staged(image_bytes, config)?;
    Ok(ScanResult {
        scan: staged.binarized,
        corners: staged.corners,
    })
}

/// Run the scan pipeline, retaining every intermediate image.
///
/// Useful for stage dumps and parameter tuning; [`scan`] is the slim
/// variant.
///
/// # Errors
///
/// Same as [`scan`].
pub fn scan_staged(image_bytes: &[u8], config: &ScanConfig) -> Result<StagedScan, PipelineError> {
    scan_staged_with_diagnostics(image_bytes, config).map(|(staged, _)| staged)
}

/// Run the scan pipeline with per-stage timing and metrics.
///
/// # Errors
///
/// Same as [`scan`].
#[allow(clippy::too_many_lines)]
pub fn scan_staged_with_diagnostics(
    image_bytes: &[u8],
    config: &ScanConfig,
) -> Result<(StagedScan, ScanDiagnostics), PipelineError> {
    config.validate()?;
    let pipeline_start = Instant::now();

    // 1. Decode.
    let start = Instant::now();
    let original = grayscale::decode(image_bytes)?;
    let decode = Stage {
        duration: start.elapsed(),
        metrics: StageMetrics::Decode {
            input_bytes: image_bytes.len(),
            width: original.width(),
            height: original.height(),
            pixel_count: u64::from(original.width()) * u64::from(original.height()),
        },
    };

    // 2. Resize to the working height the detector runs at.
    let start = Instant::now();
    let working = resize::to_working_height(&original, config.working_height);
    let resize = Stage {
        duration: start.elapsed(),
        metrics: StageMetrics::Resize {
            from_height: original.height(),
            to_height: working.image.height(),
            ratio: working.ratio,
        },
    };

    // 3. Grayscale.
    let start = Instant::now();
    let gray = grayscale::to_grayscale(&working.image);
    let gray_stage = Stage {
        duration: start.elapsed(),
        metrics: StageMetrics::Grayscale {
            width: gray.width(),
            height: gray.height(),
        },
    };

    // 4. Gaussian blur.
    let start = Instant::now();
    let blurred = blur::gaussian_blur(&gray, config.blur_sigma);
    let blur_stage = Stage {
        duration: start.elapsed(),
        metrics: StageMetrics::Blur {
            sigma: config.blur_sigma,
        },
    };

    // 5. Canny edge detection.
    let start = Instant::now();
    let edges = edge::canny(&blurred, config.canny_low, config.canny_high);
    let (low_threshold, high_threshold) =
        edge::effective_thresholds(config.canny_low, config.canny_high);
    let edge_detection = Stage {
        duration: start.elapsed(),
        metrics: StageMetrics::EdgeDetection {
            low_threshold,
            high_threshold,
            edge_pixel_count: count_nonzero_pixels(&edges),
            total_pixel_count: u64::from(edges.width()) * u64::from(edges.height()),
        },
    };

    // 6. Paper quadrilateral, scaled back to original coordinates.
    let start = Instant::now();
    let working_corners =
        quad::select_paper_quad(&edges, config.max_candidates, config.approx_epsilon_frac)?;
    let corners = working_corners.scaled(working.ratio);
    let quad_selection = Stage {
        duration: start.elapsed(),
        metrics: StageMetrics::QuadSelection {
            max_candidates: config.max_candidates,
            epsilon_frac: config.approx_epsilon_frac,
        },
    };

    // 7. Perspective rectification of the full-resolution original.
    let start = Instant::now();
    let rectified = rectify::rectify(&original, corners)?;
    let rectify_stage = Stage {
        duration: start.elapsed(),
        metrics: StageMetrics::Rectify {
            width: rectified.width(),
            height: rectified.height(),
        },
    };

    // 8. Adaptive threshold for the black-and-white scan look.
    let start = Instant::now();
    let rectified_gray = grayscale::to_grayscale(&rectified);
    let binarized =
        binarize::adaptive_threshold(&rectified_gray, config.block_radius, config.threshold_offset);
    let binarize_stage = Stage {
        duration: start.elapsed(),
        metrics: StageMetrics::Binarize {
            block_radius: config.block_radius,
            offset: config.threshold_offset,
            white_pixel_count: count_nonzero_pixels(&binarized),
            total_pixel_count: u64::from(binarized.width()) * u64::from(binarized.height()),
        },
    };

    let diagnostics = ScanDiagnostics {
        summary: ScanSummary {
            image_width: original.width(),
            image_height: original.height(),
            pixel_count: u64::from(original.width()) * u64::from(original.height()),
            output_width: binarized.width(),
            output_height: binarized.height(),
        },
        decode,
        resize,
        grayscale: gray_stage,
        blur: blur_stage,
        edge_detection,
        quad_selection,
        rectify: rectify_stage,
        binarize: binarize_stage,
        total_duration: pipeline_start.elapsed(),
    };

    let staged = StagedScan {
        original,
        working: working.image,
        grayscale: gray,
        blurred,
        edges,
        corners,
        rectified,
        binarized,
    };
    Ok((staged, diagnostics))
}

/// Run the unmark pipeline and return only the repaired image.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `image_bytes` is empty,
/// [`PipelineError::ImageDecode`] if the image format is unrecognized,
/// [`PipelineError::InvalidConfig`] for an unusable configuration, and
/// [`PipelineError::EmptyMask`] when no stamp region or no
/// surroundings exist to balance against.
pub fn unmark(image_bytes: &[u8], config: &UnmarkConfig) -> Result<RgbImage, PipelineError> {
    let staged = unmark_staged(image_bytes, config)?;
    Ok(staged.result)
}

/// Run the unmark pipeline, retaining every intermediate image.
///
/// # Errors
///
/// Same as [`unmark`].
pub fn unmark_staged(
    image_bytes: &[u8],
    config: &UnmarkConfig,
) -> Result<StagedUnmark, PipelineError> {
    unmark_staged_with_diagnostics(image_bytes, config).map(|(staged, _)| staged)
}

/// Run the unmark pipeline with per-stage timing and metrics.
///
/// # Errors
///
/// Same as [`unmark`].
#[allow(clippy::too_many_lines)]
pub fn unmark_staged_with_diagnostics(
    image_bytes: &[u8],
    config: &UnmarkConfig,
) -> Result<(StagedUnmark, UnmarkDiagnostics), PipelineError> {
    config.validate()?;
    let pipeline_start = Instant::now();

    // 1. Decode.
    let start = Instant::now();
    let original = grayscale::decode(image_bytes)?;
    let decode = Stage {
        duration: start.elapsed(),
        metrics: StageMetrics::Decode {
            input_bytes: image_bytes.len(),
            width: original.width(),
            height: original.height(),
            pixel_count: u64::from(original.width()) * u64::from(original.height()),
        },
    };

    // 2. Saturation plane: the stamp is nearly gray, the paper is not.
    let start = Instant::now();
    let saturation = hsv::saturation(&original);
    let saturation_stage = Stage {
        duration: start.elapsed(),
        metrics: StageMetrics::Saturation {
            width: saturation.width(),
            height: saturation.height(),
        },
    };

    // 3. Letter mask: threshold low saturation, label components, and
    //    keep only those populous enough to be stamp strokes.
    let start = Instant::now();
    let low_sat = blobs::low_saturation_mask(&saturation, config.saturation_threshold);
    let components = blobs::label_components(&low_sat);
    let all_blob_colored = blobs::colorize(&components, 0);
    let big_blob_colored = blobs::colorize(&components, config.population_threshold);
    let letter_mask = blobs::mask_of_colored(&big_blob_colored);
    let letter_stage = Stage {
        duration: start.elapsed(),
        metrics: StageMetrics::LetterMask {
            saturation_threshold: config.saturation_threshold,
            population_threshold: config.population_threshold,
            component_count: components.populations.len().saturating_sub(1),
            mask_pixel_count: count_nonzero_pixels(&letter_mask),
        },
    };

    // 4. Region masks around the stamp.
    let start = Instant::now();
    let regions = morphology::region_masks(&letter_mask);
    let region_stage = Stage {
        duration: start.elapsed(),
        metrics: StageMetrics::RegionMasks {
            inner_pixel_count: count_nonzero_pixels(&regions.inner),
            outer_pixel_count: count_nonzero_pixels(&regions.outer),
            edge_pixel_count: count_nonzero_pixels(&regions.edge),
        },
    };

    // 5. Split the image and match the stamp interior's brightness to
    //    its surroundings, ignoring the black pixels each half masks
    //    out.
    let start = Instant::now();
    let inner_image = composite::keep_inside(&original, &regions.inner);
    let outer_image = composite::keep_outside(&original, &regions.outer);
    let inner_hsv = hsv::HsvPlanes::from_rgb(&inner_image);
    let outer_hsv = hsv::HsvPlanes::from_rgb(&outer_image);
    let balanced_v = histmatch::match_histogram(&inner_hsv.v, &outer_hsv.v, true)?;
    let balanced_inner = hsv::HsvPlanes {
        h: inner_hsv.h,
        s: inner_hsv.s,
        v: balanced_v,
    }
    .to_rgb();
    let composited = composite::add(&balanced_inner, &outer_image);
    let histogram_match = Stage {
        duration: start.elapsed(),
        metrics: StageMetrics::HistogramMatch {
            source_pixel_count: count_nonzero_pixels(&inner_hsv.v),
            template_pixel_count: count_nonzero_pixels(&outer_hsv.v),
        },
    };

    // 6. Inpaint the seams: hue and saturation over the whole stamp
    //    surroundings, brightness only over the thin boundary ring.
    let start = Instant::now();
    let composited_hsv = hsv::HsvPlanes::from_rgb(&composited);
    let result = hsv::HsvPlanes {
        h: config
            .inpainter
            .inpaint(&composited_hsv.h, &regions.outer, config.inpaint_radius),
        s: config
            .inpainter
            .inpaint(&composited_hsv.s, &regions.outer, config.inpaint_radius),
        v: config
            .inpainter
            .inpaint(&composited_hsv.v, &regions.edge, config.inpaint_radius),
    }
    .to_rgb();
    let inpaint_stage = Stage {
        duration: start.elapsed(),
        metrics: StageMetrics::Inpaint {
            radius: config.inpaint_radius,
            outer_hole_pixel_count: count_nonzero_pixels(&regions.outer),
            edge_hole_pixel_count: count_nonzero_pixels(&regions.edge),
        },
    };

    let diagnostics = UnmarkDiagnostics {
        summary: UnmarkSummary {
            image_width: original.width(),
            image_height: original.height(),
            pixel_count: u64::from(original.width()) * u64::from(original.height()),
            component_count: components.populations.len().saturating_sub(1),
            letter_pixel_count: count_nonzero_pixels(&letter_mask),
        },
        decode,
        saturation: saturation_stage,
        letter_mask: letter_stage,
        region_masks: region_stage,
        histogram_match,
        inpaint: inpaint_stage,
        total_duration: pipeline_start.elapsed(),
    };

    let staged = StagedUnmark {
        original,
        saturation,
        big_blob_colored,
        all_blob_colored,
        letter_mask,
        inner_mask: regions.inner,
        outer_mask: regions.outer,
        edge_mask: regions.edge,
        inner_image,
        outer_image,
        balanced_inner,
        composited,
        result,
    };
    Ok((staged, diagnostics))
}
