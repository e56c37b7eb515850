//! Paper boundary selection from a binary edge map.
//!
//! Extracts contours with Suzuki-Abe border following
//! ([`imageproc::contours::find_contours`]), ranks them by enclosed
//! area, and returns the first of the largest few whose polygonal
//! approximation has exactly four vertices — the best rectangular
//! boundary candidate by area.

use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::geometry::{approximate_polygon_dp, arc_length};

use crate::types::{Corners, PipelineError, Point};

/// Enclosed area of a closed contour via the shoelace formula.
///
/// The sign depends on winding order; callers only rank by magnitude.
fn contour_area(points: &[imageproc::point::Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0i64;
    for (a, b) in points.iter().zip(points.iter().cycle().skip(1)) {
        twice_area += i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y);
    }
    #[allow(clippy::cast_precision_loss)]
    let area = (twice_area.abs() as f64) / 2.0;
    area
}

/// Find the paper boundary in a binary edge map.
///
/// Contours are ranked by enclosed area descending and the
/// `max_candidates` largest are examined in turn. Each candidate is
/// approximated with a tolerance of `epsilon_frac` times its closed
/// perimeter; the first approximation with exactly four vertices wins
/// and is returned in canonical TL, TR, BR, BL order.
///
/// # Errors
///
/// Returns [`PipelineError::NoQuadrilateral`] when no candidate
/// approximates to four vertices (including when the edge map has no
/// contours at all).
pub fn select_paper_quad(
    edges: &GrayImage,
    max_candidates: usize,
    epsilon_frac: f64,
) -> Result<Corners, PipelineError> {
    let mut contours: Vec<Vec<imageproc::point::Point<i32>>> = find_contours::<i32>(edges)
        .into_iter()
        .map(|c| c.points)
        .filter(|points| points.len() >= 3)
        .collect();

    contours.sort_by(|a, b| {
        contour_area(b)
            .partial_cmp(&contour_area(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    contours.truncate(max_candidates);

    for contour in &contours {
        let perimeter = arc_length(contour, true);
        let approx = approximate_polygon_dp(contour, epsilon_frac * perimeter, true);
        if let [a, b, c, d] = approx[..] {
            #[allow(clippy::cast_precision_loss)]
            let quad = [a, b, c, d].map(|p| Point::new(p.x as f32, p.y as f32));
            return Ok(Corners::from_unordered(quad));
        }
    }

    Err(PipelineError::NoQuadrilateral {
        candidates: max_candidates,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use imageproc::drawing::{draw_hollow_circle_mut, draw_polygon_mut};
    use imageproc::point::Point as IPoint;

    fn filled_rect(img: &mut GrayImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..=y1 {
            for x in x0..=x1 {
                img.put_pixel(x, y, image::Luma([255]));
            }
        }
    }

    #[test]
    fn empty_edge_map_has_no_quadrilateral() {
        let edges = GrayImage::new(50, 50);
        let result = select_paper_quad(&edges, 5, 0.02);
        assert!(matches!(
            result,
            Err(PipelineError::NoQuadrilateral { candidates: 5 }),
        ));
    }

    #[test]
    fn rectangle_is_selected_with_ordered_corners() {
        let mut edges = GrayImage::new(60, 60);
        filled_rect(&mut edges, 10, 15, 49, 44);

        #[allow(clippy::unwrap_used)]
        let corners = select_paper_quad(&edges, 5, 0.02).unwrap();

        // Border following walks pixel centers, so corners land within
        // a pixel of the drawn rectangle.
        let close = |p: Point, x: f32, y: f32| (p.x - x).abs() <= 1.0 && (p.y - y).abs() <= 1.0;
        assert!(close(corners.top_left, 10.0, 15.0), "{corners:?}");
        assert!(close(corners.top_right, 49.0, 15.0), "{corners:?}");
        assert!(close(corners.bottom_right, 49.0, 44.0), "{corners:?}");
        assert!(close(corners.bottom_left, 10.0, 44.0), "{corners:?}");
    }

    #[test]
    fn largest_rectangle_wins() {
        let mut edges = GrayImage::new(100, 100);
        filled_rect(&mut edges, 2, 2, 10, 10); // small
        filled_rect(&mut edges, 20, 20, 90, 90); // large

        #[allow(clippy::unwrap_used)]
        let corners = select_paper_quad(&edges, 5, 0.02).unwrap();
        assert!(
            corners.top_left.x >= 19.0 && corners.top_left.y >= 19.0,
            "expected the large rectangle, got {corners:?}",
        );
    }

    #[test]
    fn triangle_is_rejected() {
        let mut edges = GrayImage::new(80, 80);
        draw_polygon_mut(
            &mut edges,
            &[
                IPoint::new(40, 5),
                IPoint::new(70, 70),
                IPoint::new(10, 70),
            ],
            image::Luma([255]),
        );

        let result = select_paper_quad(&edges, 5, 0.02);
        assert!(matches!(result, Err(PipelineError::NoQuadrilateral { .. })));
    }

    #[test]
    fn circle_is_rejected() {
        // A circle needs well over four vertices at a 2% perimeter
        // tolerance, so it must not be mistaken for a page.
        let mut edges = GrayImage::new(100, 100);
        draw_hollow_circle_mut(&mut edges, (50, 50), 35, image::Luma([255]));

        let result = select_paper_quad(&edges, 5, 0.02);
        assert!(matches!(result, Err(PipelineError::NoQuadrilateral { .. })));
    }

    #[test]
    fn candidate_limit_is_respected() {
        // Only the single largest contour is examined when
        // max_candidates is 1; a triangle occupying the most area
        // therefore masks a smaller rectangle.
        let mut edges = GrayImage::new(120, 120);
        draw_polygon_mut(
            &mut edges,
            &[
                IPoint::new(60, 2),
                IPoint::new(115, 115),
                IPoint::new(5, 115),
            ],
            image::Luma([255]),
        );
        filled_rect(&mut edges, 2, 2, 30, 30);

        let result = select_paper_quad(&edges, 1, 0.02);
        assert!(matches!(result, Err(PipelineError::NoQuadrilateral { .. })));
    }
}
