//! Region compositing: restrict an image to a mask, and recombine
//! disjoint regions.
//!
//! The watermark pipeline splits the input into an inner image (pixels
//! under letter ink) and an outer image (pixels safely away from ink),
//! processes the inner region, then adds the two back together. The
//! supports are disjoint because the inner mask is a subset of the
//! outer mask, so the addition never mixes values.

use image::{Rgb, RgbImage};

use crate::types::GrayImage;

/// Keep pixels where the mask is set; everything else black.
#[must_use = "returns the masked image"]
pub fn keep_inside(image: &RgbImage, mask: &GrayImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        if mask.get_pixel(x, y).0[0] > 0 {
            *image.get_pixel(x, y)
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// Keep pixels where the mask is clear; everything else black.
#[must_use = "returns the masked image"]
pub fn keep_outside(image: &RgbImage, mask: &GrayImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        if mask.get_pixel(x, y).0[0] == 0 {
            *image.get_pixel(x, y)
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// Per-channel saturating addition of two images.
///
/// Intended for images with disjoint supports (at most one operand is
/// nonzero at any pixel), where it degenerates to a union; saturation
/// merely guards the overlap that disjointness should preclude.
#[must_use = "returns the combined image"]
pub fn add(a: &RgbImage, b: &RgbImage) -> RgbImage {
    RgbImage::from_fn(a.width(), a.height(), |x, y| {
        let pa = a.get_pixel(x, y).0;
        let pb = b.get_pixel(x, y).0;
        Rgb([
            pa[0].saturating_add(pb[0]),
            pa[1].saturating_add(pb[1]),
            pa[2].saturating_add(pb[2]),
        ])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient() -> RgbImage {
        RgbImage::from_fn(10, 10, |x, y| {
            Rgb([
                u8::try_from(x * 20).unwrap_or(255),
                u8::try_from(y * 20).unwrap_or(255),
                50,
            ])
        })
    }

    fn left_half_mask() -> GrayImage {
        GrayImage::from_fn(10, 10, |x, _| {
            image::Luma([if x < 5 { 255 } else { 0 }])
        })
    }

    #[test]
    fn keep_inside_blacks_out_the_complement() {
        let img = gradient();
        let inside = keep_inside(&img, &left_half_mask());
        assert_eq!(inside.get_pixel(2, 3), img.get_pixel(2, 3));
        assert_eq!(inside.get_pixel(7, 3).0, [0, 0, 0]);
    }

    #[test]
    fn keep_outside_is_the_complement_of_keep_inside() {
        let img = gradient();
        let mask = left_half_mask();
        let inside = keep_inside(&img, &mask);
        let outside = keep_outside(&img, &mask);
        assert_eq!(outside.get_pixel(7, 3), img.get_pixel(7, 3));
        assert_eq!(outside.get_pixel(2, 3).0, [0, 0, 0]);
        // Together they reconstruct the original.
        assert_eq!(add(&inside, &outside), img);
    }

    #[test]
    fn add_of_disjoint_regions_is_a_union() {
        let img = gradient();
        let mask = left_half_mask();
        let combined = add(&keep_inside(&img, &mask), &keep_outside(&img, &mask));
        assert_eq!(combined, img);
    }

    #[test]
    fn add_saturates_instead_of_wrapping() {
        let a = RgbImage::from_pixel(2, 2, Rgb([200, 200, 200]));
        let b = RgbImage::from_pixel(2, 2, Rgb([100, 100, 100]));
        let sum = add(&a, &b);
        assert_eq!(sum.get_pixel(0, 0).0, [255, 255, 255]);
    }
}
