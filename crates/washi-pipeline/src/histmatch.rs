//! Histogram matching by quantile correspondence.
//!
//! Remaps a source image's pixel-value distribution onto a template's:
//! build both empirical cumulative distributions, find each source
//! value's quantile, and linearly interpolate the template value at
//! that quantile. Used to make the region that sat under letter ink
//! statistically resemble its surroundings in brightness.
//!
//! Value 0 marks masked-out background in both operands, so it is
//! excluded from both distributions and maps to itself.

use image::GrayImage;

use crate::types::PipelineError;

/// 256-bin histogram of an image.
fn histogram(image: &GrayImage) -> [u64; 256] {
    let mut counts = [0u64; 256];
    for p in image.pixels() {
        counts[p.0[0] as usize] += 1;
    }
    counts
}

/// Remap `source` so its value distribution matches `template`'s.
///
/// The two images may have different dimensions; only their value
/// distributions interact. When `ignore_zero` is set, zero-valued
/// pixels are excluded from both distributions and remain zero in the
/// output, so masked-out background neither skews the statistics nor
/// acquires a value.
///
/// Matching an image against itself returns it unchanged.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyMask`] when either distribution is
/// empty (an all-zero image with `ignore_zero`, or an empty image),
/// since no quantiles exist to match against.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn match_histogram(
    source: &GrayImage,
    template: &GrayImage,
    ignore_zero: bool,
) -> Result<GrayImage, PipelineError> {
    let mut s_counts = histogram(source);
    let mut t_counts = histogram(template);
    if ignore_zero {
        s_counts[0] = 0;
        t_counts[0] = 0;
    }

    let s_total: u64 = s_counts.iter().sum();
    if s_total == 0 {
        return Err(PipelineError::EmptyMask {
            stage: "histogram source",
        });
    }
    let t_total: u64 = t_counts.iter().sum();
    if t_total == 0 {
        return Err(PipelineError::EmptyMask {
            stage: "histogram template",
        });
    }

    // Template CDF sampled only at values that actually occur.
    let mut t_values: Vec<f64> = Vec::new();
    let mut t_quantiles: Vec<f64> = Vec::new();
    let mut t_cum = 0u64;
    for (value, &count) in t_counts.iter().enumerate() {
        if count > 0 {
            t_cum += count;
            t_values.push(value as f64);
            t_quantiles.push(t_cum as f64 / t_total as f64);
        }
    }

    // Interpolate the template value at quantile `q`.
    let template_value_at = |q: f64| -> f64 {
        match t_quantiles.iter().position(|&tq| tq >= q) {
            Some(0) => t_values[0],
            Some(i) => {
                let (q0, q1) = (t_quantiles[i - 1], t_quantiles[i]);
                let (v0, v1) = (t_values[i - 1], t_values[i]);
                if q1 - q0 <= f64::EPSILON {
                    v1
                } else {
                    v0 + (q - q0) * (v1 - v0) / (q1 - q0)
                }
            }
            // Quantiles top out at exactly 1.0, so this only guards
            // floating-point drift.
            None => t_values[t_values.len() - 1],
        }
    };

    // Source value -> matched value, as a lookup table.
    let mut lut = [0u8; 256];
    let mut s_cum = 0u64;
    for (value, &count) in s_counts.iter().enumerate() {
        s_cum += count;
        if count > 0 {
            let q = s_cum as f64 / s_total as f64;
            lut[value] = template_value_at(q).round().clamp(0.0, 255.0) as u8;
        }
    }
    if ignore_zero {
        lut[0] = 0;
    }

    Ok(GrayImage::from_fn(source.width(), source.height(), |x, y| {
        image::Luma([lut[source.get_pixel(x, y).0[0] as usize]])
    }))
}
