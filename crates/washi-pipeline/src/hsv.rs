//! RGB ↔ HSV conversion in the byte convention used throughout the
//! watermark pipeline: H ∈ [0, 180), S and V ∈ [0, 255].
//!
//! Hue is stored halved so it fits a byte (the OpenCV convention the
//! tuning constants were calibrated against). The three channels are
//! kept as separate planes because every downstream stage — saturation
//! thresholding, brightness histogram matching, per-channel inpainting
//! — operates on exactly one of them.

use image::{GrayImage, Rgb, RgbImage};

/// An image split into hue, saturation, and value planes of identical
/// dimensions.
#[derive(Debug, Clone)]
pub struct HsvPlanes {
    /// Hue, halved into [0, 180).
    pub h: GrayImage,
    /// Saturation in [0, 255].
    pub s: GrayImage,
    /// Value (brightness) in [0, 255].
    pub v: GrayImage,
}

impl HsvPlanes {
    /// Split an RGB image into HSV planes.
    #[must_use]
    pub fn from_rgb(image: &RgbImage) -> Self {
        let (w, h) = (image.width(), image.height());
        let mut hue = GrayImage::new(w, h);
        let mut sat = GrayImage::new(w, h);
        let mut val = GrayImage::new(w, h);

        for (x, y, px) in image.enumerate_pixels() {
            let (ph, ps, pv) = rgb_to_hsv(*px);
            hue.put_pixel(x, y, image::Luma([ph]));
            sat.put_pixel(x, y, image::Luma([ps]));
            val.put_pixel(x, y, image::Luma([pv]));
        }

        Self {
            h: hue,
            s: sat,
            v: val,
        }
    }

    /// Recombine the planes into an RGB image.
    ///
    /// The planes must have identical dimensions, which holds for any
    /// `HsvPlanes` whose channels were only ever replaced whole-plane
    /// by same-sized stage outputs.
    #[must_use]
    pub fn to_rgb(&self) -> RgbImage {
        RgbImage::from_fn(self.h.width(), self.h.height(), |x, y| {
            hsv_to_rgb(
                self.h.get_pixel(x, y).0[0],
                self.s.get_pixel(x, y).0[0],
                self.v.get_pixel(x, y).0[0],
            )
        })
    }
}

/// Extract the saturation plane of an RGB image.
///
/// Printed text is near-gray, i.e. low saturation, which makes this
/// plane the letter detector's input.
#[must_use]
pub fn saturation(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let (_, s, _) = rgb_to_hsv(*image.get_pixel(x, y));
        image::Luma([s])
    })
}

/// Convert one RGB pixel to (H, S, V) bytes.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn rgb_to_hsv(px: Rgb<u8>) -> (u8, u8, u8) {
    let [r, g, b] = px.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = f32::from(max) - f32::from(min);

    let v = max;
    let s = if max == 0 {
        0
    } else {
        (255.0 * delta / f32::from(max)).round() as u8
    };

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (f32::from(g) - f32::from(b)) / delta
    } else if max == g {
        120.0 + 60.0 * (f32::from(b) - f32::from(r)) / delta
    } else {
        240.0 + 60.0 * (f32::from(r) - f32::from(g)) / delta
    };
    let h = if h < 0.0 { h + 360.0 } else { h };
    let h = ((h / 2.0).round() as u16 % 180) as u8;

    (h, s, v)
}

/// Convert (H, S, V) bytes back to an RGB pixel.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn hsv_to_rgb(h: u8, s: u8, v: u8) -> Rgb<u8> {
    let h_deg = f32::from(h) * 2.0;
    let s = f32::from(s) / 255.0;
    let v = f32::from(v) / 255.0;

    let c = v * s;
    let x = c * (1.0 - ((h_deg / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r1, g1, b1) = match h_deg {
        d if d < 60.0 => (c, x, 0.0),
        d if d < 120.0 => (x, c, 0.0),
        d if d < 180.0 => (0.0, c, x),
        d if d < 240.0 => (0.0, x, c),
        d if d < 300.0 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    let to_byte = |f: f32| ((f + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb([to_byte(r1), to_byte(g1), to_byte(b1)])
}
