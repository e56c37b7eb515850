//! Inpainting: reconstruct masked-out pixel regions from surrounding
//! context.
//!
//! This module defines the [`Inpainter`] trait for pluggable inpainting
//! algorithms and the [`InpainterKind`] enum for selecting which
//! algorithm to use at runtime, keeping the pipeline orchestration
//! independent of any particular filler.
//!
//! The shipped implementation is Telea's fast-marching method: march
//! inward from the hole boundary in distance order, filling each pixel
//! with a weighted average of already-known pixels in its
//! neighborhood. Weights favor contributors that are close, level with
//! the marching front, and aligned with its normal, which propagates
//! structure rather than just smearing.

use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Selects which inpainting algorithm to use.
///
/// Ships with [`FastMarching`](Self::FastMarching) only; a
/// diffusion-based variant could be added without touching the
/// pipeline code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InpainterKind {
    /// Telea fast-marching method.
    #[default]
    FastMarching,
}

/// Trait for inpainting strategies.
///
/// Input: a single-channel image, a hole mask (255 = repair, 0 =
/// keep), and a neighborhood radius. Output: the image with hole
/// pixels reconstructed; pixels outside the mask are untouched.
pub trait Inpainter {
    /// Fill the masked region of `image` from its surroundings.
    fn inpaint(&self, image: &GrayImage, mask: &GrayImage, radius: u32) -> GrayImage;
}

impl Inpainter for InpainterKind {
    fn inpaint(&self, image: &GrayImage, mask: &GrayImage, radius: u32) -> GrayImage {
        match *self {
            Self::FastMarching => fast_marching(image, mask, radius),
        }
    }
}

/// Pixel state during the march.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flag {
    /// Value is trusted: originally outside the hole, or already
    /// inpainted.
    Known,
    /// On the advancing front, queued for processing.
    Band,
    /// Inside the hole, not yet reached.
    Inside,
}

/// Heap entry: a band pixel keyed by its distance-to-boundary.
///
/// Ordered by distance (then coordinates, for a total order) so the
/// `BinaryHeap` of `Reverse<BandPixel>` pops the closest pixel first.
#[derive(Debug, Clone, Copy)]
struct BandPixel {
    t: f32,
    x: u32,
    y: u32,
}

impl PartialEq for BandPixel {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BandPixel {}

impl Ord for BandPixel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.t
            .total_cmp(&other.t)
            .then_with(|| self.x.cmp(&other.x))
            .then_with(|| self.y.cmp(&other.y))
    }
}

impl PartialOrd for BandPixel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Distance value treated as "unreached".
const FAR: f32 = 1.0e6;

/// Working grid for the fast-marching state.
struct Grid {
    width: u32,
    height: u32,
    flags: Vec<Flag>,
    t: Vec<f32>,
}

impl Grid {
    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    fn flag(&self, x: u32, y: u32) -> Flag {
        self.flags[self.index(x, y)]
    }

    fn dist(&self, x: u32, y: u32) -> f32 {
        self.t[self.index(x, y)]
    }

    /// Distance of a neighbor, or [`FAR`] when out of bounds or not
    /// yet known.
    fn known_dist(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return FAR;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let (x, y) = (x as u32, y as u32);
        if self.flag(x, y) == Flag::Known {
            self.dist(x, y)
        } else {
            FAR
        }
    }

    /// One step of the eikonal update from two orthogonal neighbors.
    fn eikonal(t1: f32, t2: f32) -> f32 {
        let (a, b) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
        if a >= FAR {
            return FAR;
        }
        let diff = b - a;
        if diff >= 1.0 {
            a + 1.0
        } else {
            // Both neighbors constrain the front: solve the quadratic.
            (a + b + (2.0 - diff * diff).sqrt()) / 2.0
        }
    }

    /// Shortest-arrival estimate at `(x, y)` from its known neighbors.
    fn solve(&self, x: u32, y: u32) -> f32 {
        let (xi, yi) = (i64::from(x), i64::from(y));
        let left = self.known_dist(xi - 1, yi);
        let right = self.known_dist(xi + 1, yi);
        let up = self.known_dist(xi, yi - 1);
        let down = self.known_dist(xi, yi + 1);

        Self::eikonal(left, up)
            .min(Self::eikonal(right, up))
            .min(Self::eikonal(left, down))
            .min(Self::eikonal(right, down))
    }

    /// Central-difference gradient of the distance field at `(x, y)`,
    /// using only known neighbors.
    fn grad_t(&self, x: u32, y: u32) -> (f32, f32) {
        let (xi, yi) = (i64::from(x), i64::from(y));
        let here = self.dist(x, y);
        let component = |prev: f32, next: f32| {
            if prev < FAR && next < FAR {
                (next - prev) / 2.0
            } else if next < FAR {
                next - here
            } else if prev < FAR {
                here - prev
            } else {
                0.0
            }
        };
        (
            component(self.known_dist(xi - 1, yi), self.known_dist(xi + 1, yi)),
            component(self.known_dist(xi, yi - 1), self.known_dist(xi, yi + 1)),
        )
    }
}

/// Fill the masked region of `image` with Telea's fast-marching
/// method.
///
/// `mask` must have the same dimensions as `image`; 255 marks pixels
/// to reconstruct. `radius` bounds the neighborhood a pixel is
/// averaged from. Hole pixels that no known pixel can reach (a mask
/// covering the entire image) keep their input values.
#[must_use = "returns the inpainted image"]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn fast_marching(image: &GrayImage, mask: &GrayImage, radius: u32) -> GrayImage {
    let (width, height) = (image.width(), image.height());
    let mut out = image.clone();
    if width == 0 || height == 0 || radius == 0 {
        return out;
    }

    let in_hole = |x: u32, y: u32| mask.get_pixel(x, y).0[0] > 0;

    let mut grid = Grid {
        width,
        height,
        flags: vec![Flag::Known; (width * height) as usize],
        t: vec![0.0; (width * height) as usize],
    };
    for y in 0..height {
        for x in 0..width {
            if in_hole(x, y) {
                let i = grid.index(x, y);
                grid.flags[i] = Flag::Inside;
                grid.t[i] = FAR;
            }
        }
    }

    // Initial band: known pixels bordering the hole, at distance zero.
    let mut heap: BinaryHeap<std::cmp::Reverse<BandPixel>> = BinaryHeap::new();
    for y in 0..height {
        for x in 0..width {
            if grid.flag(x, y) != Flag::Known {
                continue;
            }
            let borders_hole = neighbors4(x, y, width, height)
                .into_iter()
                .flatten()
                .any(|(nx, ny)| in_hole(nx, ny));
            if borders_hole {
                let i = grid.index(x, y);
                grid.flags[i] = Flag::Band;
                grid.t[i] = 0.0;
                heap.push(std::cmp::Reverse(BandPixel { t: 0.0, x, y }));
            }
        }
    }

    // March: always advance the closest band pixel, inpainting hole
    // pixels as the front reaches them.
    while let Some(std::cmp::Reverse(pixel)) = heap.pop() {
        let i = grid.index(pixel.x, pixel.y);
        if grid.flags[i] == Flag::Known {
            continue; // stale heap entry
        }
        grid.flags[i] = Flag::Known;

        for (nx, ny) in neighbors4(pixel.x, pixel.y, width, height)
            .into_iter()
            .flatten()
        {
            if grid.flag(nx, ny) != Flag::Inside {
                continue;
            }
            let ni = grid.index(nx, ny);
            grid.t[ni] = grid.solve(nx, ny);
            inpaint_pixel(&mut out, &grid, nx, ny, radius);
            grid.flags[ni] = Flag::Band;
            heap.push(std::cmp::Reverse(BandPixel {
                t: grid.t[ni],
                x: nx,
                y: ny,
            }));
        }
    }

    out
}

/// The in-bounds 4-neighbors of a pixel.
fn neighbors4(x: u32, y: u32, width: u32, height: u32) -> [Option<(u32, u32)>; 4] {
    [
        (x > 0).then(|| (x - 1, y)),
        (x + 1 < width).then_some((x + 1, y)),
        (y > 0).then(|| (x, y - 1)),
        (y + 1 < height).then_some((x, y + 1)),
    ]
}

/// Telea's weighted average for a single hole pixel.
///
/// Contributors are known pixels within `radius`; each is weighted by
/// the product of a direction term (alignment with the front normal),
/// a geometric distance term, and a level-set term (how close its
/// front arrival time is to ours).
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)]
fn inpaint_pixel(out: &mut GrayImage, grid: &Grid, x: u32, y: u32, radius: u32) {
    let (gx, gy) = grid.grad_t(x, y);
    let here_t = grid.dist(x, y);
    let r = i64::from(radius);
    // Squared in f64 so large radii cannot wrap u32 arithmetic.
    let radius_sq = f64::from(radius) * f64::from(radius);

    let mut weight_sum = 0.0f64;
    let mut value_sum = 0.0f64;

    let (xi, yi) = (i64::from(x), i64::from(y));
    for ny in (yi - r).max(0)..=(yi + r).min(i64::from(grid.height) - 1) {
        for nx in (xi - r).max(0)..=(xi + r).min(i64::from(grid.width) - 1) {
            let (ux, uy) = (nx as u32, ny as u32);
            if grid.flag(ux, uy) != Flag::Known {
                continue;
            }

            let dx = (xi - nx) as f32;
            let dy = (yi - ny) as f32;
            let dist_sq = dx.mul_add(dx, dy * dy);
            if f64::from(dist_sq) > radius_sq || dist_sq == 0.0 {
                continue;
            }
            let dist = dist_sq.sqrt();

            let direction = (dx * gx + dy * gy).abs() / dist;
            let direction = if direction < 1.0e-6 { 1.0e-6 } else { direction };
            let geometric = 1.0 / (dist * dist_sq);
            let level = 1.0 / (1.0 + (grid.dist(ux, uy) - here_t).abs());

            let weight = f64::from(direction * geometric * level);
            weight_sum += weight;
            value_sum += weight * f64::from(out.get_pixel(ux, uy).0[0]);
        }
    }

    if weight_sum > 0.0 {
        let value = (value_sum / weight_sum).round().clamp(0.0, 255.0) as u8;
        out.put_pixel(x, y, image::Luma([value]));
    }
}
