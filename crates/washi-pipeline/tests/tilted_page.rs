//! Integration test: run a synthetic tilted page photo through the full scan pipeline.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use washi_pipeline::{Point, RgbImage, ScanConfig};

/// Encode an RGB image as PNG bytes.
fn encode_png(img: &RgbImage) -> Vec<u8> {
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgb8,
    )
    .unwrap();
    buf
}

/// A dark desk with a bright sheet of paper photographed at an angle.
fn tilted_page_png(corners: [(i32, i32); 4]) -> Vec<u8> {
    let mut img = RgbImage::from_pixel(160, 200, image::Rgb([30, 26, 24]));
    let points: Vec<imageproc::point::Point<i32>> = corners
        .iter()
        .map(|&(x, y)| imageproc::point::Point::new(x, y))
        .collect();
    imageproc::drawing::draw_polygon_mut(&mut img, &points, image::Rgb([238, 236, 228]));
    encode_png(&img)
}

#[test]
fn tilted_page_is_found_rectified_and_binarized() {
    let expected = [(30, 20), (140, 35), (130, 180), (20, 165)];
    let png = tilted_page_png(expected);

    let staged =
        washi_pipeline::scan_staged(&png, &ScanConfig::default()).expect("scan should succeed");

    // Detected corners land on the drawn sheet boundary, in original
    // image coordinates and TL,TR,BR,BL order.
    let found = staged.corners.to_array();
    for (f, &(ex, ey)) in found.iter().zip(expected.iter()) {
        let (dx, dy) = (f.x - ex as f32, f.y - ey as f32);
        assert!(
            dx.abs() <= 6.0 && dy.abs() <= 6.0,
            "corner {f:?} too far from ({ex}, {ey})",
        );
    }

    // Output dimensions follow the sheet's edge lengths: top/bottom
    // about 111 px, left/right about 145 px.
    let (w, h) = (staged.binarized.width(), staged.binarized.height());
    assert!(
        (103..=119).contains(&w) && (137..=153).contains(&h),
        "unexpected rectified dimensions {w}x{h}",
    );

    // The rectified sheet binarizes almost entirely white away from
    // the border.
    let mut white = 0usize;
    let mut total = 0usize;
    for y in 5..h - 5 {
        for x in 5..w - 5 {
            total += 1;
            if staged.binarized.get_pixel(x, y).0[0] == 255 {
                white += 1;
            }
        }
    }
    assert!(
        white * 100 >= total * 95,
        "expected a mostly white scan interior, got {white}/{total}",
    );
}

#[test]
fn corner_ordering_is_stable_under_rotated_input() {
    let corners = [(30, 20), (140, 35), (130, 180), (20, 165)];
    let rotated = [(130, 180), (20, 165), (30, 20), (140, 35)];

    let a = washi_pipeline::scan(&tilted_page_png(corners), &ScanConfig::default()).unwrap();
    let b = washi_pipeline::scan(&tilted_page_png(rotated), &ScanConfig::default()).unwrap();

    // Same drawing, so the same corners come back in the same order
    // regardless of how the polygon was specified.
    let pairs = a.corners.to_array().into_iter().zip(b.corners.to_array());
    for (pa, pb) in pairs {
        assert!(
            Point::distance(pa, pb) <= 1.0,
            "corner order diverged: {pa:?} vs {pb:?}",
        );
    }
}
