//! Canny edge detection.
//!
//! Wraps [`imageproc::edges::canny`] to detect edges in the blurred
//! grayscale working copy. Returns a binary image where white pixels
//! (255) are edges and black pixels (0) are background; the contour
//! selector consumes this map to find the paper boundary.

use image::GrayImage;

/// Minimum allowed Canny threshold.
///
/// A low threshold of zero makes every pixel with any gradient a
/// potential edge, producing a dense edge map that drowns the paper
/// boundary in noise during contour ranking.
pub const MIN_THRESHOLD: f32 = 1.0;
const _: () = assert!(MIN_THRESHOLD > 0.0);

/// Detect edges using the Canny algorithm.
///
/// Returns a binary image: 255 for edge pixels, 0 for non-edge.
///
/// Pixels with gradient magnitude above `high_threshold` are definite
/// edges; those between the thresholds are edges only if connected to
/// a definite edge. Both thresholds are clamped to at least
/// [`MIN_THRESHOLD`] and `low_threshold` to at most `high_threshold`,
/// so no parameter combination can produce a degenerate edge map.
#[must_use = "returns the binary edge map"]
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let (low, high) = effective_thresholds(low_threshold, high_threshold);
    imageproc::edges::canny(image, low, high)
}

/// The `(low, high)` thresholds [`canny`] actually runs with.
#[must_use]
pub fn effective_thresholds(low_threshold: f32, high_threshold: f32) -> (f32, f32) {
    let high = high_threshold.max(MIN_THRESHOLD);
    let low = low_threshold.max(MIN_THRESHOLD).min(high);
    (low, high)
}
