//! Contour simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! Traced contours are rectilinear staircases with one vertex per turn.
//! This step drops vertices that stay within a tolerance of the line
//! through their neighbours, before the hull is expanded.
//!
//! The split search runs on an explicit worklist rather than the call
//! stack, so pathological inputs cannot exhaust the stack. The kept set
//! and its order match the recursive formulation exactly.

use crate::types::{Contour, Point, Region};

/// Contours with fewer points than this are returned unchanged.
pub const MIN_REDUCIBLE_POINTS: usize = 9;

/// Simplify a traced contour.
///
/// Contours with fewer than [`MIN_REDUCIBLE_POINTS`] points are returned
/// unchanged. Otherwise `epsilon` is clamped to `[0, min(w, h) / 2]` of
/// `region` and Ramer-Douglas-Peucker runs over the loop as an open
/// sequence from its first point to its last.
///
/// A final seam stitch handles the closing edge the open-sequence pass
/// cannot see: when the last point sits below the first and within
/// half the tolerance of it (Manhattan distance), the first point is
/// lowered to the last point's `y` and the last point is dropped. This
/// is a heuristic tuned for contours that start by walking downwards,
/// as the tracer's do.
#[must_use = "returns the simplified contour"]
pub fn reduce(contour: &Contour, region: Region, epsilon: f64) -> Contour {
    let points = contour.points();
    if points.len() < MIN_REDUCIBLE_POINTS {
        log::debug!(
            "contour with {} points is too small to simplify",
            points.len()
        );
        return contour.clone();
    }

    let max_tolerance = f64::from(region.width.min(region.height)) / 2.0;
    let tolerance = epsilon.clamp(0.0, max_tolerance);

    let mut simplified = douglas_peucker(points, tolerance);
    stitch_seam(&mut simplified, tolerance);
    Contour::new(simplified)
}

/// Ramer-Douglas-Peucker over an open point sequence.
///
/// The first and last points are always kept. A split point is the
/// first point with the strictly greatest distance from the line
/// through its span's endpoints; it is kept when that distance exceeds
/// `tolerance`.
fn douglas_peucker(points: &[Point], tolerance: f64) -> Vec<Point> {
    let Some(last) = points.len().checked_sub(1) else {
        return Vec::new();
    };

    let mut kept = vec![false; points.len()];
    kept[0] = true;
    kept[last] = true;

    let mut pending = vec![(0, last)];
    while let Some((start, end)) = pending.pop() {
        let mut max_dist = 0.0;
        let mut split = None;
        for (i, &p) in points.iter().enumerate().take(end).skip(start + 1) {
            let d = perpendicular_distance(p, points[start], points[end]);
            if d > max_dist {
                max_dist = d;
                split = Some(i);
            }
        }

        if let Some(i) = split
            && max_dist > tolerance
        {
            kept[i] = true;
            pending.push((i, end));
            pending.push((start, i));
        }
    }

    points
        .iter()
        .zip(&kept)
        .filter(|&(_, k)| *k)
        .map(|(&p, _)| p)
        .collect()
}

/// Close a near-degenerate seam between the last and first points.
fn stitch_seam(points: &mut Vec<Point>, tolerance: f64) {
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return;
    };
    if points.len() > 1 && last.y > first.y && last.manhattan_distance(first) < tolerance * 0.5 {
        points[0].y = last.y;
        points.pop();
    }
}

/// Distance from `p` to the line through `start` and `end`.
///
/// Vertical reference lines measure horizontal pixel distance and
/// horizontal ones vertical pixel distance. Everything else uses the
/// slope-intercept form of the line. Coincident endpoints count as a
/// vertical line.
#[allow(clippy::float_cmp)]
fn perpendicular_distance(p: Point, start: Point, end: Point) -> f64 {
    if start.x == end.x {
        (p.x - end.x).abs()
    } else if start.y == end.y {
        (p.y - end.y).abs()
    } else {
        let slope = (end.y - start.y) / (end.x - start.x);
        let intercept = slope.mul_add(-start.x, start.y);
        slope.mul_add(p.x, -p.y + intercept).abs() / slope.mul_add(slope, 1.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contour(points: &[(f64, f64)]) -> Contour {
        Contour::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    /// A 10x10 square walked from just below its top-left corner, with
    /// redundant midpoints on every side.
    fn square_with_midpoints() -> Contour {
        contour(&[
            (0.0, 9.5),
            (0.0, 5.0),
            (0.0, 0.0),
            (5.0, 0.0),
            (10.0, 0.0),
            (10.0, 5.0),
            (10.0, 10.0),
            (5.0, 10.0),
            (0.0, 10.0),
        ])
    }

    #[test]
    fn empty_contour_unchanged() {
        let result = reduce(&Contour::default(), Region::new(0, 0, 10, 10), 1.0);
        assert!(result.is_empty());
    }

    #[test]
    fn two_points_unchanged() {
        let c = contour(&[(0.0, 0.0), (10.0, 0.0)]);
        assert_eq!(reduce(&c, Region::new(0, 0, 10, 10), 1.0), c);
    }

    #[test]
    fn small_contours_are_idempotent() {
        // 3 to 8 points are returned as-is, however aggressive epsilon is.
        for n in 3..MIN_REDUCIBLE_POINTS {
            let points: Vec<(f64, f64)> = (0..n)
                .map(|i| {
                    let angle = std::f64::consts::TAU * i as f64 / n as f64;
                    (10.0 + 5.0 * angle.cos(), 10.0 + 5.0 * angle.sin())
                })
                .collect();
            let c = contour(&points);
            let once = reduce(&c, Region::new(0, 0, 20, 20), 4.0);
            assert_eq!(once, c, "{n}-point contour was modified");
            assert_eq!(reduce(&once, Region::new(0, 0, 20, 20), 4.0), once);
        }
    }

    #[test]
    fn square_collapses_to_corners_with_seam_stitched() {
        let result = reduce(&square_with_midpoints(), Region::new(0, 0, 20, 20), 2.0);
        assert_eq!(
            result,
            contour(&[(0.0, 10.0), (0.0, 0.0), (10.0, 0.0), (10.0, 10.0)])
        );
    }

    #[test]
    fn tolerance_is_clamped_to_half_the_region() {
        // Unclamped, epsilon 100 would flatten everything. A 4x4 region
        // caps the tolerance at 2, which keeps the corners.
        let result = reduce(&square_with_midpoints(), Region::new(0, 0, 4, 4), 100.0);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn large_tolerance_collapses_to_endpoints() {
        // Region 100x100 allows tolerance 50: only the endpoints survive,
        // and the seam stitch merges them.
        let result = reduce(&square_with_midpoints(), Region::new(0, 0, 100, 100), 100.0);
        assert_eq!(result, contour(&[(0.0, 10.0)]));
    }

    #[test]
    fn zero_tolerance_keeps_every_turn() {
        let staircase = contour(&[
            (0.0, 1.0),
            (0.0, 8.0),
            (1.0, 8.0),
            (1.0, 7.0),
            (2.0, 7.0),
            (2.0, 6.0),
            (3.0, 6.0),
            (3.0, 5.0),
            (4.0, 5.0),
            (4.0, 0.0),
        ]);
        let result = reduce(&staircase, Region::new(0, 0, 10, 10), 0.0);
        assert_eq!(result, staircase);
    }

    #[test]
    fn worklist_matches_recursive_order() {
        // The kept points come out in input order.
        let result = douglas_peucker(square_with_midpoints().points(), 1.0);
        let xs: Vec<f64> = result.iter().map(|p| p.x).collect();
        let ys: Vec<f64> = result.iter().map(|p| p.y).collect();
        assert_eq!(xs, vec![0.0, 0.0, 10.0, 10.0, 0.0]);
        assert_eq!(ys, vec![9.5, 0.0, 0.0, 10.0, 10.0]);
    }

    #[test]
    fn long_zigzag_keeps_every_point() {
        // Every span has an outlier, forcing a deep split chain.
        let mut points: Vec<Point> = (0..2_000)
            .map(|i| Point::new(f64::from(i), if i % 2 == 0 { 0.0 } else { 3.0 }))
            .collect();
        points.push(Point::new(2_000.0, 0.0));
        let result = douglas_peucker(&points, 1.0);
        assert_eq!(result.len(), points.len());
    }

    #[test]
    fn perpendicular_distance_vertical_reference() {
        let d = perpendicular_distance(
            Point::new(3.0, 7.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 10.0),
        );
        assert!((d - 2.0).abs() < 1e-12);
    }

    #[test]
    fn perpendicular_distance_horizontal_reference() {
        let d = perpendicular_distance(
            Point::new(1.0, 3.0),
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
        );
        assert!((d - 3.0).abs() < 1e-12);
    }

    #[test]
    fn perpendicular_distance_diagonal_reference() {
        // Point (2, -1) from line (0,0)->(4,2): 8 / sqrt(20).
        let d = perpendicular_distance(
            Point::new(2.0, -1.0),
            Point::new(0.0, 0.0),
            Point::new(4.0, 2.0),
        );
        let expected = 8.0 / 20.0_f64.sqrt();
        assert!((d - expected).abs() < 1e-10, "got {d}, expected {expected}");
    }

    #[test]
    fn perpendicular_distance_coincident_endpoints_is_horizontal() {
        let d = perpendicular_distance(
            Point::new(3.0, 4.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
        );
        assert!((d - 3.0).abs() < 1e-12);
    }
}
