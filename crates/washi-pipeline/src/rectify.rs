//! Perspective rectification: warp a detected quad to a top-down view.
//!
//! Given the four ordered paper corners in full-resolution coordinates,
//! computes the destination rectangle from the quad's edge lengths and
//! applies a projective transform via
//! [`imageproc::geometric_transformations`]. The output carries no
//! aspect distortion beyond what the quadrilateral itself implies.

use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

use crate::types::{Corners, PipelineError};

/// Destination size for a rectified quad.
///
/// Width is the longer of the top and bottom edges, height the longer
/// of the left and right edges, each rounded to the nearest pixel and
/// at least one.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn output_dimensions(corners: Corners) -> (u32, u32) {
    let Corners {
        top_left,
        top_right,
        bottom_right,
        bottom_left,
    } = corners;

    let top = top_left.distance(top_right);
    let bottom = bottom_left.distance(bottom_right);
    let left = top_left.distance(bottom_left);
    let right = top_right.distance(bottom_right);

    let width = (top.max(bottom).round() as u32).max(1);
    let height = (left.max(right).round() as u32).max(1);
    (width, height)
}

/// Warp the quad bounded by `corners` onto an axis-aligned rectangle.
///
/// The corners must be in canonical TL, TR, BR, BL order (see
/// [`Corners::from_unordered`]) and in the coordinate space of
/// `image`. Samples outside the source bounds come out black.
///
/// # Errors
///
/// Returns [`PipelineError::DegenerateQuad`] when the corners are
/// collinear or coincident and no projective transform exists.
#[allow(clippy::cast_precision_loss)]
pub fn rectify(image: &RgbImage, corners: Corners) -> Result<RgbImage, PipelineError> {
    let (width, height) = output_dimensions(corners);

    let [tl, tr, br, bl] = corners.to_array();
    let from = [(tl.x, tl.y), (tr.x, tr.y), (br.x, br.y), (bl.x, bl.y)];
    let right = (width - 1) as f32;
    let bottom = (height - 1) as f32;
    let to = [(0.0, 0.0), (right, 0.0), (right, bottom), (0.0, bottom)];

    let projection =
        Projection::from_control_points(from, to).ok_or(PipelineError::DegenerateQuad)?;

    let mut out = RgbImage::new(width, height);
    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
        &mut out,
    );
    Ok(out)
}
