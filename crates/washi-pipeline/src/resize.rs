//! Resizing a photo to the detection working height.
//!
//! Paper boundary detection does not need full resolution: the photo is
//! shrunk so its height matches the configured working height before
//! blur, Canny, and contour analysis run. The full-resolution original
//! is kept aside, and the detected quad is scaled back onto it with the
//! recorded ratio before rectification.

use image::RgbImage;

/// A working copy of the input plus the factor mapping working-copy
/// coordinates back to the original.
#[derive(Debug, Clone)]
pub struct WorkingCopy {
    /// The resized image.
    pub image: RgbImage,
    /// Multiply working-copy coordinates by this to get original
    /// coordinates (`original_height / working_height`).
    pub ratio: f32,
}

/// Resize an image to the given height, preserving aspect ratio.
///
/// Bilinear (triangle) filtering; quality beyond that is irrelevant at
/// detection resolution. Images shorter than `height` are upscaled —
/// the detection parameters are tuned for a fixed working height, so a
/// consistent scale matters more than avoiding interpolation.
///
/// Width is derived from the aspect ratio and clamped to at least one
/// pixel so extreme aspect ratios cannot produce an empty image.
#[must_use = "returns the resized working copy"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_working_height(image: &RgbImage, height: u32) -> WorkingCopy {
    let (w, h) = (image.width(), image.height());
    if h == height {
        return WorkingCopy {
            image: image.clone(),
            ratio: 1.0,
        };
    }

    // f64 keeps the width computation exact for any realistic photo.
    let scale = f64::from(height) / f64::from(h);
    let width = ((f64::from(w) * scale).round() as u32).max(1);
    let resized = image::imageops::resize(
        image,
        width,
        height,
        image::imageops::FilterType::Triangle,
    );

    WorkingCopy {
        image: resized,
        ratio: (f64::from(h) / f64::from(height)) as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_height_is_identity() {
        let img = RgbImage::from_pixel(40, 30, image::Rgb([9, 9, 9]));
        let working = to_working_height(&img, 30);
        assert_eq!(working.image, img);
        assert!((working.ratio - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn downscale_preserves_aspect_ratio() {
        let img = RgbImage::new(800, 600);
        let working = to_working_height(&img, 300);
        assert_eq!(working.image.height(), 300);
        assert_eq!(working.image.width(), 400);
        assert!((working.ratio - 2.0).abs() < 1e-6);
    }

    #[test]
    fn upscale_also_targets_working_height() {
        let img = RgbImage::new(100, 50);
        let working = to_working_height(&img, 200);
        assert_eq!(working.image.height(), 200);
        assert_eq!(working.image.width(), 400);
        assert!((working.ratio - 0.25).abs() < 1e-6);
    }

    #[test]
    fn extreme_aspect_ratio_keeps_at_least_one_column() {
        let img = RgbImage::new(1, 1000);
        let working = to_working_height(&img, 10);
        assert_eq!(working.image.height(), 10);
        assert_eq!(working.image.width(), 1);
    }

    #[test]
    fn ratio_round_trips_coordinates() {
        let img = RgbImage::new(1024, 768);
        let working = to_working_height(&img, 500);
        // A point at the bottom edge of the working copy maps back to
        // the bottom edge of the original.
        let mapped = 500.0 * working.ratio;
        assert!((mapped - 768.0).abs() < 0.5, "mapped to {mapped}");
    }
}
