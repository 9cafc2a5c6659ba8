//! Polygon expansion, clamping, and containment.
//!
//! Simplified contours hug the opaque pixels. Before triangulation each
//! one is grown outward by a margin so the mesh fully covers
//! anti-aliased edges, then clipped back to the region rectangle.
//!
//! All geometry runs in a fixed-point space: coordinates are scaled by
//! [`PRECISION`] and rounded to integers first, and the result is
//! rounded again on the way out. Every output coordinate is therefore
//! an exact multiple of `1 / PRECISION`, which keeps exact-equality
//! vertex deduplication downstream reliable.

use geo::algorithm::buffer::{BufferStyle, LineJoin};
use geo::coordinate_position::{CoordPos, CoordinatePosition};
use geo::{BooleanOps, Buffer, Coord, LineString, Polygon, Rect};
use serde::{Deserialize, Serialize};

use crate::types::{Contour, Point, Region};

/// Fixed-point scale factor applied before any polygon operation.
pub const PRECISION: f64 = 10.0;

/// Vertices closer than this (in fixed-point units) to a neighbour, or
/// to the line through both neighbours, are removed before offsetting.
/// One source pixel.
const CLEAN_DISTANCE: f64 = PRECISION;

/// Sharpest corner, in radians, that the offset keeps mitered; sharper
/// corners are squared off. `PI / 3` caps a miter at twice the margin.
const MITER_MIN_ANGLE: f64 = std::f64::consts::FRAC_PI_3;

/// What to do with hull polygons that lie inside other hull polygons.
///
/// A sprite with a transparent hole traces an outer loop and, after the
/// outer blob is erased, sometimes a smaller loop inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestedPolicy {
    /// Triangulate every polygon independently, nested or not.
    #[default]
    Keep,

    /// Drop any polygon whose every vertex lies strictly inside another
    /// kept polygon. See [`absorb_nested`].
    Absorb,
}

impl NestedPolicy {
    /// Apply the policy to a set of expanded hull polygons.
    #[must_use]
    pub fn apply(self, polygons: Vec<Contour>) -> Vec<Contour> {
        match self {
            Self::Keep => polygons,
            Self::Absorb => absorb_nested(polygons),
        }
    }
}

/// Grow a closed contour outward by `margin` pixels and clip it to
/// `region`.
///
/// Returns an empty contour when the input has fewer than 3 points,
/// when cleaning leaves fewer than 3, or when the offset or the clip
/// produce no polygon. A zero margin skips the offset and only cleans
/// and clips. Holes in the offset result are ignored; only the first
/// polygon's exterior ring is kept.
///
/// The output lies within `[0, width] x [0, height]` of `region`, has
/// no repeated closing point, and no two consecutive equal points.
#[must_use = "returns the expanded contour"]
pub fn expand(contour: &Contour, region: Region, margin: f64) -> Contour {
    if contour.len() < 3 {
        log::debug!("contour with {} points is too small to expand", contour.len());
        return Contour::default();
    }

    let Some(polygon) = fixed_polygon(contour) else {
        log::debug!("contour degenerated while cleaning");
        return Contour::default();
    };

    let outline = if margin > 0.0 {
        let style = BufferStyle::new(margin * PRECISION).line_join(LineJoin::Miter(MITER_MIN_ANGLE));
        let Some(grown) = polygon.buffer_with_style(style).0.into_iter().next() else {
            log::warn!("offsetting a {}-point contour by {margin} produced nothing", contour.len());
            return Contour::default();
        };
        let (exterior, _holes) = grown.into_inner();
        Polygon::new(exterior, vec![])
    } else {
        polygon
    };

    let bounds = Rect::new(
        Coord { x: 0.0, y: 0.0 },
        Coord {
            x: f64::from(region.width) * PRECISION,
            y: f64::from(region.height) * PRECISION,
        },
    )
    .to_polygon();

    let Some(clipped) = outline.intersection(&bounds).0.into_iter().next() else {
        log::warn!("clipping to region {region} left nothing");
        return Contour::default();
    };

    let points = from_fixed_ring(clipped.exterior());
    if points.len() < 3 {
        log::debug!("clipped contour collapsed to {} points", points.len());
        return Contour::default();
    }
    Contour::new(points)
}

/// Remove every point of `candidate` that lies strictly inside
/// `container`.
///
/// Points on the container's boundary stay. Returns whether anything was
/// removed. A container with fewer than 3 usable points contains
/// nothing.
pub fn is_contained_in(candidate: &mut Contour, container: &Contour) -> bool {
    let Some(polygon) = fixed_polygon(container) else {
        return false;
    };

    let before = candidate.len();
    let outside: Vec<Point> = std::mem::take(candidate)
        .into_points()
        .into_iter()
        .filter(|&p| polygon.coordinate_position(&to_fixed(p)) != CoordPos::Inside)
        .collect();
    *candidate = Contour::new(outside);
    candidate.len() != before
}

/// Drop every polygon that lies entirely inside another kept polygon.
///
/// Polygons are checked in order against all polygons not yet dropped.
/// "Entirely inside" means every vertex is strictly interior to the
/// container, as decided by [`is_contained_in`].
#[must_use]
pub fn absorb_nested(polygons: Vec<Contour>) -> Vec<Contour> {
    let mut dropped = vec![false; polygons.len()];
    for (i, candidate) in polygons.iter().enumerate() {
        let absorbed = polygons.iter().enumerate().any(|(j, container)| {
            if i == j || dropped[j] {
                return false;
            }
            let mut remaining = candidate.clone();
            is_contained_in(&mut remaining, container) && remaining.is_empty()
        });
        if absorbed {
            log::debug!("absorbing nested polygon {i} ({} points)", candidate.len());
            dropped[i] = true;
        }
    }

    polygons
        .into_iter()
        .zip(dropped)
        .filter_map(|(polygon, dropped)| (!dropped).then_some(polygon))
        .collect()
}

fn to_fixed(p: Point) -> Coord<f64> {
    Coord {
        x: (p.x * PRECISION).round(),
        y: (p.y * PRECISION).round(),
    }
}

/// Scale, round, and clean a contour into a fixed-point polygon.
fn fixed_polygon(contour: &Contour) -> Option<Polygon<f64>> {
    let ring = clean_ring(contour.points().iter().map(|&p| to_fixed(p)).collect(), CLEAN_DISTANCE);
    (ring.len() >= 3).then(|| Polygon::new(LineString::from(ring), vec![]))
}

/// Round a fixed-point ring back into pixel space.
fn from_fixed_ring(ring: &LineString<f64>) -> Vec<Point> {
    let mut points: Vec<Point> = ring
        .coords()
        .map(|c| Point::new(c.x.round(), c.y.round()))
        .collect();
    points.dedup();
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    for p in &mut points {
        p.x /= PRECISION;
        p.y /= PRECISION;
    }
    points
}

/// Remove near-duplicate and near-collinear vertices from a closed ring.
///
/// A vertex goes when it is within `distance` of its predecessor or
/// nearly collinear with its neighbours. When the predecessor and
/// successor are within `distance` of each other the vertex and its
/// successor both go. After a removal the predecessor is re-examined.
/// Rings that end up with fewer than 3 vertices come back empty.
fn clean_ring(mut ring: Vec<Coord<f64>>, distance: f64) -> Vec<Coord<f64>> {
    let dist_sq = distance * distance;
    let mut settled = vec![false; ring.len()];
    let mut i = 0;

    while ring.len() >= 3 && !settled[i] {
        let n = ring.len();
        let prev = (i + n - 1) % n;
        let next = (i + 1) % n;
        let (p, c, nx) = (ring[prev], ring[i], ring[next]);

        let removed = if points_close(c, p, dist_sq) {
            vec![i]
        } else if points_close(p, nx, dist_sq) {
            vec![i.max(next), i.min(next)]
        } else if near_collinear(p, c, nx, dist_sq) {
            vec![i]
        } else {
            settled[i] = true;
            i = next;
            continue;
        };

        for &idx in &removed {
            ring.remove(idx);
            settled.remove(idx);
        }
        i = prev - removed.iter().filter(|&&idx| idx < prev).count();
        if let Some(flag) = settled.get_mut(i) {
            *flag = false;
        }
    }

    if ring.len() < 3 { Vec::new() } else { ring }
}

fn points_close(a: Coord<f64>, b: Coord<f64>, dist_sq: f64) -> bool {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    dx.mul_add(dx, dy * dy) <= dist_sq
}

/// Whether whichever of the three points lies between the other two
/// (along the dominant axis of `a -> b`) is within `dist_sq` of the
/// line through them.
fn near_collinear(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>, dist_sq: f64) -> bool {
    let between = |lo: f64, mid: f64, hi: f64| (mid > lo) == (mid < hi);
    let (ax, bx, cx) = if (a.x - b.x).abs() > (a.y - b.y).abs() {
        (a.x, b.x, c.x)
    } else {
        (a.y, b.y, c.y)
    };

    if between(bx, ax, cx) {
        distance_from_line_sq(a, b, c) < dist_sq
    } else if between(ax, bx, cx) {
        distance_from_line_sq(b, a, c) < dist_sq
    } else {
        distance_from_line_sq(c, a, b) < dist_sq
    }
}

/// Squared distance from `pt` to the infinite line through `l1` and `l2`.
fn distance_from_line_sq(pt: Coord<f64>, l1: Coord<f64>, l2: Coord<f64>) -> f64 {
    let a = l1.y - l2.y;
    let b = l2.x - l1.x;
    let c = a.mul_add(pt.x, b * pt.y) - a.mul_add(l1.x, b * l1.y);
    (c * c) / a.mul_add(a, b * b)
}
