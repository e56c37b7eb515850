//! Adaptive binarization for the "black and white paper" effect.
//!
//! Thresholds each pixel against the mean of its square neighborhood,
//! less a fixed offset: `white where pixel > mean - offset`. The offset
//! keeps smooth shading and paper texture on the white side so only
//! genuine print survives as black.
//!
//! `imageproc::contrast::adaptive_threshold` computes the same local
//! mean but has no offset parameter, so the comparison is done here on
//! top of a summed-area table.

use image::GrayImage;

/// Summed-area table: `sums[y][x]` is the sum over the rectangle from
/// the origin to `(x - 1, y - 1)` exclusive.
fn integral(image: &GrayImage) -> Vec<Vec<u64>> {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let mut sums = vec![vec![0u64; w + 1]; h + 1];
    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            #[allow(clippy::cast_possible_truncation)]
            let px = u64::from(image.get_pixel(x as u32, y as u32).0[0]);
            row_sum += px;
            sums[y + 1][x + 1] = sums[y][x + 1] + row_sum;
        }
    }
    sums
}

/// Binarize with a local-mean threshold.
///
/// The neighborhood is the square of side `2 * block_radius + 1`
/// centered on each pixel, clamped at the image borders. A pixel
/// becomes white (255) when it exceeds the neighborhood mean minus
/// `offset`, black (0) otherwise.
#[must_use = "returns the binarized image"]
#[allow(clippy::cast_possible_truncation)]
pub fn adaptive_threshold(image: &GrayImage, block_radius: u32, offset: u8) -> GrayImage {
    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 {
        return image.clone();
    }

    let sums = integral(image);
    let r = i64::from(block_radius);

    GrayImage::from_fn(w, h, |x, y| {
        let x0 = (i64::from(x) - r).max(0) as usize;
        let y0 = (i64::from(y) - r).max(0) as usize;
        let x1 = (i64::from(x) + r).min(i64::from(w) - 1) as usize;
        let y1 = (i64::from(y) + r).min(i64::from(h) - 1) as usize;

        let sum = sums[y1 + 1][x1 + 1] + sums[y0][x0] - sums[y0][x1 + 1] - sums[y1 + 1][x0];
        let count = ((x1 - x0 + 1) * (y1 - y0 + 1)) as u64;

        // pixel > mean - offset, kept in integer arithmetic:
        // (pixel + offset) * count > sum
        let px = u64::from(image.get_pixel(x, y).0[0]);
        let white = (px + u64::from(offset)) * count > sum;
        image::Luma([if white { 255 } else { 0 }])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_image_becomes_all_white() {
        // Every pixel equals its local mean, so any positive offset
        // pushes the whole image to white.
        let img = GrayImage::from_pixel(30, 30, image::Luma([128]));
        let out = adaptive_threshold(&img, 5, 10);
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn dark_stroke_on_light_page_survives_as_black() {
        // Light page with a dark vertical stroke at x = 15..18.
        let img = GrayImage::from_fn(40, 40, |x, _y| {
            if (15..18).contains(&x) {
                image::Luma([20])
            } else {
                image::Luma([200])
            }
        });
        let out = adaptive_threshold(&img, 5, 10);

        assert_eq!(out.get_pixel(16, 20).0[0], 0, "stroke center");
        assert_eq!(out.get_pixel(5, 20).0[0], 255, "page far from stroke");
        assert_eq!(out.get_pixel(35, 20).0[0], 255, "page far from stroke");
    }

    #[test]
    fn large_offset_swallows_faint_marks() {
        // A faint mark only slightly below the page brightness is
        // absorbed into white once the offset exceeds the contrast.
        let img = GrayImage::from_fn(40, 40, |x, _y| {
            if (15..18).contains(&x) {
                image::Luma([190])
            } else {
                image::Luma([200])
            }
        });
        let out = adaptive_threshold(&img, 5, 30);
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn output_dimensions_match_input() {
        let out = adaptive_threshold(&GrayImage::new(17, 31), 5, 10);
        assert_eq!((out.width(), out.height()), (17, 31));
    }

    #[test]
    fn gradient_page_stays_white_despite_global_contrast() {
        // A global brightness gradient defeats a fixed threshold but
        // not a local one: no pixel is far below its local mean.
        let img = GrayImage::from_fn(64, 64, |x, _y| image::Luma([64 + u8::try_from(x).unwrap_or(0) * 3]));
        let out = adaptive_threshold(&img, 5, 10);
        let white: u32 = out.pixels().map(|p| u32::from(p.0[0] == 255)).sum();
        let total = 64 * 64;
        assert!(
            white * 100 >= total * 95,
            "expected ≥95% white, got {white}/{total}",
        );
    }
}
