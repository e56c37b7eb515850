//! Inner, outer, and edge masks derived from the letter mask.
//!
//! The inner mask shrinks the letter mask to land safely inside letter
//! ink (a dilation first smooths single-pixel gaps, then two erosions
//! contract); the outer mask grows it to cover the ink plus a margin.
//! The ring between the two is where outline and anti-aliasing
//! artifacts live, and it gets its own inpainting treatment.
//!
//! All operations use [`imageproc::morphology`] with an L1 norm of
//! radius 1: the cross-shaped structuring element the mask-building
//! tuning assumes.

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{dilate, erode};

/// The three masks derived from one letter mask.
///
/// Invariant: `inner` ⊆ `outer`, since two erosions of a dilation can
/// never reach pixels that two dilations do not.
#[derive(Debug, Clone)]
pub struct RegionMasks {
    /// Letter mask smoothed and contracted: strictly inside letter ink.
    pub inner: GrayImage,
    /// Letter mask expanded: letter ink plus a safety margin.
    pub outer: GrayImage,
    /// `outer ∧ ¬inner`: the ring containing outline artifacts.
    pub edge: GrayImage,
}

/// Build the inner, outer, and edge masks from a letter mask.
#[must_use = "returns the derived region masks"]
pub fn region_masks(letter_mask: &GrayImage) -> RegionMasks {
    let inner = erode(&erode(&dilate(letter_mask, Norm::L1, 1), Norm::L1, 1), Norm::L1, 1);
    let outer = dilate(&dilate(letter_mask, Norm::L1, 1), Norm::L1, 1);

    let edge = GrayImage::from_fn(letter_mask.width(), letter_mask.height(), |x, y| {
        let in_outer = outer.get_pixel(x, y).0[0] > 0;
        let in_inner = inner.get_pixel(x, y).0[0] > 0;
        image::Luma([if in_outer && !in_inner { 255 } else { 0 }])
    });

    RegionMasks { inner, outer, edge }
}

/// Whether every foreground pixel of `a` is also foreground in `b`.
#[must_use]
pub fn is_subset(a: &GrayImage, b: &GrayImage) -> bool {
    a.enumerate_pixels()
        .all(|(x, y, p)| p.0[0] == 0 || b.get_pixel(x, y).0[0] > 0)
}
