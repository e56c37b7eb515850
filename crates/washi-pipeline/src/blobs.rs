//! Letter detection via connected components of low-saturation pixels.
//!
//! Printed text is close to gray, so thresholding the saturation plane
//! flags candidate ink. Components are labeled with 4-connectivity
//! ([`imageproc::region_labelling`]); small components are speckle
//! noise and get filtered by population, and the survivors form the
//! letter mask.
//!
//! Each label is also assigned a deterministic nonzero display color
//! (a siphash of the label), which keeps the colorized diagnostic
//! images reproducible across runs.

use std::hash::Hasher;

use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::contrast::{ThresholdType, threshold};
use imageproc::region_labelling::{Connectivity, connected_components};
use siphasher::sip::SipHasher13;

/// A label image and the pixel population of each label.
///
/// Label 0 is the background; `populations[0]` counts background
/// pixels.
#[derive(Debug, Clone)]
pub struct LabeledComponents {
    /// Per-pixel component labels.
    pub labels: ImageBuffer<Luma<u32>, Vec<u32>>,
    /// Pixel count per label, indexed by label.
    pub populations: Vec<u32>,
}

/// Flag low-saturation pixels as letter-ink candidates.
///
/// Inverse binary threshold: pixels at or below `level` become white
/// (255), pixels above it black (0).
#[must_use = "returns the candidate-ink mask"]
pub fn low_saturation_mask(saturation: &GrayImage, level: u8) -> GrayImage {
    threshold(saturation, level, ThresholdType::BinaryInverted)
}

/// Label connected components of a binary mask with 4-connectivity and
/// count each label's population.
#[must_use]
pub fn label_components(mask: &GrayImage) -> LabeledComponents {
    let labels = connected_components(mask, Connectivity::Four, Luma([0u8]));

    let max_label = labels.pixels().map(|p| p.0[0]).max().unwrap_or(0);
    let mut populations = vec![0u32; max_label as usize + 1];
    for p in labels.pixels() {
        populations[p.0[0] as usize] += 1;
    }

    LabeledComponents {
        labels,
        populations,
    }
}

/// Deterministic display color for a component label.
///
/// Channels are mapped into `1..=255` so no foreground label can
/// colorize to black; [`mask_of_colored`] relies on that.
fn label_color(label: u32) -> Rgb<u8> {
    let mut hasher = SipHasher13::new_with_keys(0x77617368, 0x69626c6f);
    hasher.write_u32(label);
    let bytes = hasher.finish().to_le_bytes();
    Rgb([
        1 + bytes[0] % 255,
        1 + bytes[1] % 255,
        1 + bytes[2] % 255,
    ])
}

/// Colorize a label image.
///
/// Label 0 (background) is always black. When `population_threshold`
/// is nonzero, labels with fewer pixels than the threshold are also
/// forced to black, filtering speckle while leaving genuine letter
/// strokes colored.
#[must_use = "returns the colorized component image"]
pub fn colorize(components: &LabeledComponents, population_threshold: u32) -> RgbImage {
    let color_map: Vec<Rgb<u8>> = components
        .populations
        .iter()
        .enumerate()
        .map(|(label, &population)| {
            let filtered = population_threshold != 0 && population < population_threshold;
            if label == 0 || filtered {
                Rgb([0, 0, 0])
            } else {
                #[allow(clippy::cast_possible_truncation)]
                label_color(label as u32)
            }
        })
        .collect();

    RgbImage::from_fn(
        components.labels.width(),
        components.labels.height(),
        |x, y| {
            let label = components.labels.get_pixel(x, y).0[0] as usize;
            color_map.get(label).copied().unwrap_or(Rgb([0, 0, 0]))
        },
    )
}

/// Binary mask of every pixel with any nonzero channel.
///
/// Applied to the population-filtered colorized image this yields the
/// letter mask: exactly the pixels belonging to a surviving component.
#[must_use = "returns the derived mask"]
pub fn mask_of_colored(colored: &RgbImage) -> GrayImage {
    GrayImage::from_fn(colored.width(), colored.height(), |x, y| {
        let px = colored.get_pixel(x, y).0;
        image::Luma([if px.iter().any(|&c| c > 0) { 255 } else { 0 }])
    })
}
