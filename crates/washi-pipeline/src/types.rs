//! Shared types for the washi image processing pipelines.

use serde::{Deserialize, Serialize};

use crate::inpaint::InpainterKind;

/// Re-export `GrayImage` so downstream crates can reference
/// single-channel intermediates without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can reference color
/// intermediates without depending on `image` directly.
pub use image::RgbImage;

/// A 2D point in image coordinates.
///
/// Stored as `f32` because corner positions become sub-pixel once the
/// detection-resolution quad is scaled back to the full-resolution
/// image, and because the projective transform consumes `f32` control
/// points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f32,
    /// Vertical position (pixels from top edge).
    pub y: f32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.hypot(dy)
    }
}

/// Four corners of a convex quadrilateral in a fixed cyclic order:
/// top-left, top-right, bottom-right, bottom-left.
///
/// Construct via [`Corners::from_unordered`], which accepts the four
/// points in any order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Corners {
    /// Corner with the smallest coordinate sum.
    pub top_left: Point,
    /// Corner with the smallest `y - x` difference.
    pub top_right: Point,
    /// Corner with the largest coordinate sum.
    pub bottom_right: Point,
    /// Corner with the largest `y - x` difference.
    pub bottom_left: Point,
}

impl Corners {
    /// Order four arbitrary corner points into the canonical
    /// TL, TR, BR, BL cycle.
    ///
    /// The top-left corner has the smallest `x + y` sum and the
    /// bottom-right the largest; of the remaining two, the top-right
    /// has the smallest `y - x` difference and the bottom-left the
    /// largest. For any convex quadrilateral this yields a consistent
    /// cyclic order regardless of input order, and re-ordering an
    /// already-ordered quad is a no-op.
    #[must_use]
    pub fn from_unordered(points: [Point; 4]) -> Self {
        let sum = |p: Point| p.x + p.y;
        let diff = |p: Point| p.y - p.x;

        let mut top_left = points[0];
        let mut top_right = points[0];
        let mut bottom_right = points[0];
        let mut bottom_left = points[0];
        for p in points {
            if sum(p) < sum(top_left) {
                top_left = p;
            }
            if sum(p) > sum(bottom_right) {
                bottom_right = p;
            }
            if diff(p) < diff(top_right) {
                top_right = p;
            }
            if diff(p) > diff(bottom_left) {
                bottom_left = p;
            }
        }

        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    /// The corners as an array in TL, TR, BR, BL order.
    #[must_use]
    pub const fn to_array(self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Scale every corner by a uniform factor.
    ///
    /// Used to map a quad detected at working resolution back onto the
    /// full-resolution original.
    #[must_use]
    pub fn scaled(self, factor: f32) -> Self {
        let scale = |p: Point| Point::new(p.x * factor, p.y * factor);
        Self {
            top_left: scale(self.top_left),
            top_right: scale(self.top_right),
            bottom_right: scale(self.bottom_right),
            bottom_left: scale(self.bottom_left),
        }
    }
}

/// Configuration for the document scan pipeline (Pipeline A).
///
/// All parameters have defaults matching the reference tuning; each CLI
/// flag defaults to the corresponding `DEFAULT_*` const so the two
/// cannot silently diverge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Height in pixels the photo is resized to before edge detection.
    /// Detection runs at this working resolution; rectification always
    /// uses the full-resolution original.
    pub working_height: u32,

    /// Gaussian blur sigma applied before edge detection.
    /// Non-positive values skip the blur.
    pub blur_sigma: f32,

    /// Canny low threshold (clamped to at least 1.0 and at most
    /// `canny_high`).
    pub canny_low: f32,

    /// Canny high threshold (clamped to at least 1.0).
    pub canny_high: f32,

    /// How many of the largest-area contours to consider as paper
    /// boundary candidates.
    pub max_candidates: usize,

    /// Polygon approximation tolerance as a fraction of each contour's
    /// closed perimeter.
    pub approx_epsilon_frac: f64,

    /// Radius of the square neighborhood used by the adaptive
    /// binarizer (side length `2 * block_radius + 1`).
    pub block_radius: u32,

    /// Subtracted from the local mean before comparison: a pixel is
    /// white when it exceeds `mean - threshold_offset`. Larger values
    /// push more of the page to white.
    pub threshold_offset: u8,
}

impl ScanConfig {
    /// Default working height.
    pub const DEFAULT_WORKING_HEIGHT: u32 = 500;
    /// Default blur sigma.
    pub const DEFAULT_BLUR_SIGMA: f32 = 1.4;
    /// Default Canny low threshold.
    pub const DEFAULT_CANNY_LOW: f32 = 75.0;
    /// Default Canny high threshold.
    pub const DEFAULT_CANNY_HIGH: f32 = 200.0;
    /// Default number of contour candidates.
    pub const DEFAULT_MAX_CANDIDATES: usize = 5;
    /// Default polygon approximation tolerance fraction.
    pub const DEFAULT_APPROX_EPSILON_FRAC: f64 = 0.02;
    /// Default binarizer block radius.
    pub const DEFAULT_BLOCK_RADIUS: u32 = 5;
    /// Default binarizer offset.
    pub const DEFAULT_THRESHOLD_OFFSET: u8 = 10;

    /// Check invariants that the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] when `working_height`
    /// or `max_candidates` is zero, or `approx_epsilon_frac` is not a
    /// positive finite fraction.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.working_height == 0 {
            return Err(PipelineError::InvalidConfig(
                "working_height must be at least 1".to_string(),
            ));
        }
        if self.max_candidates == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_candidates must be at least 1".to_string(),
            ));
        }
        if !(self.approx_epsilon_frac.is_finite() && self.approx_epsilon_frac > 0.0) {
            return Err(PipelineError::InvalidConfig(
                "approx_epsilon_frac must be a positive finite fraction".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            working_height: Self::DEFAULT_WORKING_HEIGHT,
            blur_sigma: Self::DEFAULT_BLUR_SIGMA,
            canny_low: Self::DEFAULT_CANNY_LOW,
            canny_high: Self::DEFAULT_CANNY_HIGH,
            max_candidates: Self::DEFAULT_MAX_CANDIDATES,
            approx_epsilon_frac: Self::DEFAULT_APPROX_EPSILON_FRAC,
            block_radius: Self::DEFAULT_BLOCK_RADIUS,
            threshold_offset: Self::DEFAULT_THRESHOLD_OFFSET,
        }
    }
}

/// Configuration for the watermark removal pipeline (Pipeline B).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmarkConfig {
    /// Saturation level below which a pixel is a letter-ink candidate.
    /// Printed text is close to gray, i.e. low saturation.
    pub saturation_threshold: u8,

    /// Connected components with fewer pixels than this are discarded
    /// as speckle noise.
    pub population_threshold: u32,

    /// Neighborhood radius for the inpainting filler.
    pub inpaint_radius: u32,

    /// Which inpainting algorithm to use.
    pub inpainter: InpainterKind,
}

impl UnmarkConfig {
    /// Default saturation threshold (50 was too high, 25 too low on
    /// the reference material).
    pub const DEFAULT_SATURATION_THRESHOLD: u8 = 42;
    /// Default component population threshold.
    pub const DEFAULT_POPULATION_THRESHOLD: u32 = 170;
    /// Default inpainting radius.
    pub const DEFAULT_INPAINT_RADIUS: u32 = 15;

    /// Check invariants that the pipeline relies on.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] when `inpaint_radius`
    /// is zero.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.inpaint_radius == 0 {
            return Err(PipelineError::InvalidConfig(
                "inpaint_radius must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for UnmarkConfig {
    fn default() -> Self {
        Self {
            saturation_threshold: Self::DEFAULT_SATURATION_THRESHOLD,
            population_threshold: Self::DEFAULT_POPULATION_THRESHOLD,
            inpaint_radius: Self::DEFAULT_INPAINT_RADIUS,
            inpainter: InpainterKind::default(),
        }
    }
}

/// Result of the document scan pipeline when intermediates are not
/// needed.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// The binarized top-down scan.
    pub scan: GrayImage,
    /// The detected paper corners in full-resolution image coordinates.
    pub corners: Corners,
}

/// All intermediates of the document scan pipeline.
///
/// Each field captures the output of one stage so callers can dump or
/// preview every step of the processing chain.
#[derive(Debug, Clone)]
pub struct StagedScan {
    /// Stage 0: decoded full-resolution image.
    pub original: RgbImage,
    /// Stage 1: working copy resized to `working_height`.
    pub working: RgbImage,
    /// Stage 2: grayscale working copy.
    pub grayscale: GrayImage,
    /// Stage 3: Gaussian-blurred grayscale.
    pub blurred: GrayImage,
    /// Stage 4: Canny edge map.
    pub edges: GrayImage,
    /// Stage 5: selected paper quad, scaled to full-resolution
    /// coordinates and canonically ordered.
    pub corners: Corners,
    /// Stage 6: perspective-rectified full-resolution image.
    pub rectified: RgbImage,
    /// Stage 7: adaptively binarized scan.
    pub binarized: GrayImage,
}

/// All intermediates of the watermark removal pipeline.
///
/// Field names follow the stage names the pipeline has always written
/// to disk, so `washi-unmark --out-dir` output stays recognizable.
#[derive(Debug, Clone)]
pub struct StagedUnmark {
    /// Stage 0: decoded input image.
    pub original: RgbImage,
    /// Stage 1: HSV saturation channel.
    pub saturation: GrayImage,
    /// Stage 2a: components colorized with small ones filtered out.
    pub big_blob_colored: RgbImage,
    /// Stage 2b: every component colorized, no filtering.
    pub all_blob_colored: RgbImage,
    /// Stage 2c: letter mask — pixels of any surviving component.
    pub letter_mask: GrayImage,
    /// Stage 3a: letter mask shrunk to sit inside letter ink.
    pub inner_mask: GrayImage,
    /// Stage 3b: letter mask grown to cover ink plus a margin.
    pub outer_mask: GrayImage,
    /// Stage 3c: ring between outer and inner masks.
    pub edge_mask: GrayImage,
    /// Stage 4a: original restricted to the inner mask.
    pub inner_image: RgbImage,
    /// Stage 4b: original restricted to the complement of the outer
    /// mask.
    pub outer_image: RgbImage,
    /// Stage 5: inner image with its brightness histogram matched to
    /// the outer image.
    pub balanced_inner: RgbImage,
    /// Stage 6: balanced inner + outer composite, pre-inpainting.
    pub composited: RgbImage,
    /// Stage 7: final inpainted result.
    pub result: RgbImage,
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// No paper boundary found: none of the largest contours
    /// approximates to a four-vertex polygon.
    #[error("no four-point contour among the {candidates} largest candidates")]
    NoQuadrilateral {
        /// How many candidate contours were examined.
        candidates: usize,
    },

    /// The detected corners admit no projective transform (collinear
    /// or coincident points).
    #[error("paper corners are degenerate; no perspective transform exists")]
    DegenerateQuad,

    /// A mask selected no pixels, so the downstream statistics would
    /// be undefined.
    #[error("the {stage} mask selects no pixels")]
    EmptyMask {
        /// Name of the stage whose mask was empty.
        stage: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Point tests ---

    #[test]
    fn point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(b) - 5.0).abs() < f32::EPSILON);
    }

    #[test]
    fn point_distance_to_self_is_zero() {
        let p = Point::new(7.0, 11.0);
        assert!(p.distance(p).abs() < f32::EPSILON);
    }

    // --- Corner ordering tests ---

    fn axis_aligned_quad() -> [Point; 4] {
        [
            Point::new(10.0, 10.0), // TL
            Point::new(90.0, 10.0), // TR
            Point::new(90.0, 60.0), // BR
            Point::new(10.0, 60.0), // BL
        ]
    }

    #[test]
    fn ordering_of_axis_aligned_quad() {
        let corners = Corners::from_unordered(axis_aligned_quad());
        assert_eq!(corners.top_left, Point::new(10.0, 10.0));
        assert_eq!(corners.top_right, Point::new(90.0, 10.0));
        assert_eq!(corners.bottom_right, Point::new(90.0, 60.0));
        assert_eq!(corners.bottom_left, Point::new(10.0, 60.0));
    }

    #[test]
    fn ordering_is_independent_of_input_order() {
        let [tl, tr, br, bl] = axis_aligned_quad();
        let expected = Corners::from_unordered([tl, tr, br, bl]);
        let permutations = [
            [br, tl, bl, tr],
            [bl, br, tr, tl],
            [tr, bl, tl, br],
            [br, bl, tl, tr],
        ];
        for perm in permutations {
            assert_eq!(Corners::from_unordered(perm), expected);
        }
    }

    #[test]
    fn ordering_is_idempotent() {
        let corners = Corners::from_unordered(axis_aligned_quad());
        let reordered = Corners::from_unordered(corners.to_array());
        assert_eq!(corners, reordered);
    }

    #[test]
    fn ordering_of_tilted_quad() {
        // A convex quad photographed at an angle: no two corners share
        // an x or y coordinate.
        let corners = Corners::from_unordered([
            Point::new(80.0, 15.0),
            Point::new(5.0, 70.0),
            Point::new(12.0, 8.0),
            Point::new(95.0, 78.0),
        ]);
        assert_eq!(corners.top_left, Point::new(12.0, 8.0));
        assert_eq!(corners.top_right, Point::new(80.0, 15.0));
        assert_eq!(corners.bottom_right, Point::new(95.0, 78.0));
        assert_eq!(corners.bottom_left, Point::new(5.0, 70.0));
    }

    #[test]
    fn scaled_multiplies_every_corner() {
        let corners = Corners::from_unordered(axis_aligned_quad()).scaled(2.0);
        assert_eq!(corners.top_left, Point::new(20.0, 20.0));
        assert_eq!(corners.bottom_right, Point::new(180.0, 120.0));
    }

    // --- Config tests ---

    #[test]
    fn scan_config_defaults() {
        let config = ScanConfig::default();
        assert_eq!(config.working_height, 500);
        assert!((config.canny_low - 75.0).abs() < f32::EPSILON);
        assert!((config.canny_high - 200.0).abs() < f32::EPSILON);
        assert_eq!(config.max_candidates, 5);
        assert!((config.approx_epsilon_frac - 0.02).abs() < f64::EPSILON);
        assert_eq!(config.block_radius, 5);
        assert_eq!(config.threshold_offset, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unmark_config_defaults() {
        let config = UnmarkConfig::default();
        assert_eq!(config.saturation_threshold, 42);
        assert_eq!(config.population_threshold, 170);
        assert_eq!(config.inpaint_radius, 15);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_working_height_is_invalid() {
        let config = ScanConfig {
            working_height: 0,
            ..ScanConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_inpaint_radius_is_invalid() {
        let config = UnmarkConfig {
            inpaint_radius: 0,
            ..UnmarkConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    // --- Error display tests ---

    #[test]
    fn no_quadrilateral_display() {
        let err = PipelineError::NoQuadrilateral { candidates: 5 };
        assert_eq!(
            err.to_string(),
            "no four-point contour among the 5 largest candidates",
        );
    }

    #[test]
    fn empty_mask_display() {
        let err = PipelineError::EmptyMask { stage: "inner" };
        assert_eq!(err.to_string(), "the inner mask selects no pixels");
    }

    // --- Serde round trips (configs are captured/replayed as JSON) ---

    #[test]
    #[allow(clippy::unwrap_used)]
    fn scan_config_serde_round_trip() {
        let config = ScanConfig {
            canny_low: 30.0,
            block_radius: 7,
            ..ScanConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: ScanConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn unmark_config_serde_round_trip() {
        let config = UnmarkConfig {
            population_threshold: 40,
            ..UnmarkConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: UnmarkConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
