//! Contour tracing: walk the boundary of one opaque blob.
//!
//! The tracer is a marching-squares boundary follower. The cursor sits
//! on pixel *corners*: lattice point `(x, y)` is the top-left corner of
//! pixel `(x, y)`. At every step the four pixels around the cursor are
//! classified as opaque or not and packed into a "square value":
//!
//! ```text
//! +---+---+
//! | 1 | 2 |
//! +---+---+
//! | 4 | 8 |  <- pixel (x, y) is the bottom-right one
//! +---+---+
//! ```
//!
//! The value selects the next step. Runs of identical steps are
//! collapsed, so the output holds one vertex per direction change: a
//! rectilinear polygon in region-local coordinates.

use std::collections::HashSet;

use crate::sampler::AlphaSampler;
use crate::types::{Contour, HullError, Point, Region};

/// One unit move of the tracing cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Up,
    Down,
    Left,
    Right,
}

impl Step {
    const fn delta(self) -> (i64, i64) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

/// Trace the first opaque blob in `region`.
///
/// The seed is the topmost-leftmost pixel of the sampling window whose
/// alpha exceeds `threshold`. The sampling window is `region` shrunk by
/// one pixel on its right and bottom edges; pixels outside it count as
/// transparent.
///
/// Returns an empty contour when the window holds no opaque pixel.
///
/// # Errors
///
/// Returns [`HullError::InvalidSquare`] if the cursor lands on a cell
/// with no boundary through it (square value 0 or 15), and
/// [`HullError::TraceRunaway`] if the walk takes more steps than the
/// image has pixels without returning to the seed.
pub fn trace(sampler: &AlphaSampler, region: Region, threshold: u8) -> Result<Contour, HullError> {
    let window = sampling_window(region);
    match sampler.first_opaque_in(window, threshold) {
        Some(seed) => march(sampler, region, seed, threshold),
        None => Ok(Contour::default()),
    }
}

/// The part of `region` whose pixels the tracer samples.
const fn sampling_window(region: Region) -> Region {
    Region::new(
        region.left,
        region.top,
        region.width.saturating_sub(1),
        region.height.saturating_sub(1),
    )
}

/// Walk the boundary starting at lattice point `seed`, giving up after
/// as many steps as the image has pixels.
fn march(
    sampler: &AlphaSampler,
    region: Region,
    seed: (u32, u32),
    threshold: u8,
) -> Result<Contour, HullError> {
    let limit = sampler.dimensions().pixel_count();
    march_with_limit(sampler, region, seed, threshold, limit)
}

#[allow(clippy::cast_precision_loss)]
fn march_with_limit(
    sampler: &AlphaSampler,
    region: Region,
    seed: (u32, u32),
    threshold: u8,
    limit: u64,
) -> Result<Contour, HullError> {
    let window = sampling_window(region);
    let start = (i64::from(seed.0), i64::from(seed.1));
    let (origin_x, origin_y) = (i64::from(region.left), i64::from(region.top));

    let mut cursor = start;
    let mut previous: Option<Step> = None;
    // (x, y, square value) of saddle cells already passed this trace.
    let mut saddles: HashSet<(i64, i64, u8)> = HashSet::new();
    let mut points: Vec<Point> = Vec::new();
    let mut steps: u64 = 0;

    loop {
        let value = square_value(sampler, window, cursor, threshold);
        let step = match value {
            1 | 5 | 13 => Step::Up,
            8 | 10 | 11 => Step::Down,
            4 | 12 | 14 => Step::Left,
            2 | 3 | 7 => Step::Right,
            // +---+---+
            // | 1 |   |
            // +---+---+
            // |   | 8 |
            // +---+---+
            // Up the first time through, down on the way back.
            9 => {
                if saddles.remove(&(cursor.0, cursor.1, 9)) {
                    Step::Down
                } else {
                    saddles.insert((cursor.0, cursor.1, 9));
                    Step::Up
                }
            }
            // +---+---+
            // |   | 2 |
            // +---+---+
            // | 4 |   |
            // +---+---+
            // Right the first time through, left on the way back.
            6 => {
                if saddles.remove(&(cursor.0, cursor.1, 6)) {
                    Step::Left
                } else {
                    saddles.insert((cursor.0, cursor.1, 6));
                    Step::Right
                }
            }
            _ => {
                return Err(HullError::InvalidSquare {
                    value,
                    x: cursor.0,
                    y: cursor.1,
                    region,
                    threshold,
                });
            }
        };

        let (dx, dy) = step.delta();
        cursor = (cursor.0 + dx, cursor.1 + dy);
        let here = Point::new((cursor.0 - origin_x) as f64, (cursor.1 - origin_y) as f64);

        if previous == Some(step)
            && let Some(last) = points.last_mut()
        {
            *last = here;
        } else {
            points.push(here);
        }
        previous = Some(step);

        steps += 1;
        if steps > limit {
            return Err(HullError::TraceRunaway {
                limit,
                region,
                threshold,
            });
        }
        if cursor == start {
            break;
        }
    }

    log::trace!(
        "traced contour with {} vertices in {steps} steps from seed {seed:?}",
        points.len()
    );
    Ok(Contour::new(points))
}

/// Pack the opacity of the four pixels around lattice point `cursor`.
///
/// Pixels outside `window` are transparent, which keeps every lookup
/// inside the image.
fn square_value(sampler: &AlphaSampler, window: Region, cursor: (i64, i64), threshold: u8) -> u8 {
    let (x, y) = cursor;
    let opaque = |px: i64, py: i64| -> bool {
        let left = i64::from(window.left);
        let top = i64::from(window.top);
        let inside = px >= left
            && py >= top
            && px < left + i64::from(window.width)
            && py < top + i64::from(window.height);
        inside
            && match (u32::try_from(px), u32::try_from(py)) {
                (Ok(px), Ok(py)) => sampler.is_opaque(px, py, threshold),
                _ => false,
            }
    };

    let mut value = 0;
    if opaque(x - 1, y - 1) {
        value |= 1;
    }
    if opaque(x, y - 1) {
        value |= 2;
    }
    if opaque(x - 1, y) {
        value |= 4;
    }
    if opaque(x, y) {
        value |= 8;
    }
    value
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use image::{GrayImage, Luma};

    use super::*;

    fn sampler_from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> AlphaSampler {
        AlphaSampler::from_alpha(GrayImage::from_fn(width, height, |x, y| {
            Luma([if f(x, y) { 255 } else { 0 }])
        }))
    }

    #[test]
    fn transparent_region_traces_empty() {
        let sampler = sampler_from_fn(10, 10, |_, _| false);
        let contour = trace(&sampler, Region::new(0, 0, 10, 10), 128).unwrap();
        assert!(contour.is_empty());
    }

    #[test]
    fn bordered_square_traces_four_corners() {
        // Fully opaque except a 1-pixel transparent border.
        let sampler = sampler_from_fn(10, 10, |x, y| (1..9).contains(&x) && (1..9).contains(&y));
        let contour = trace(&sampler, Region::new(0, 0, 10, 10), 128).unwrap();
        assert_eq!(
            contour.points(),
            &[
                Point::new(1.0, 9.0),
                Point::new(9.0, 9.0),
                Point::new(9.0, 1.0),
                Point::new(1.0, 1.0),
            ]
        );
    }

    #[test]
    fn filled_rectangle_traces_its_corners() {
        let sampler = sampler_from_fn(20, 12, |x, y| (4..15).contains(&x) && (3..7).contains(&y));
        let contour = trace(&sampler, Region::new(0, 0, 20, 12), 0).unwrap();
        assert_eq!(contour.len(), 4);
        for corner in [
            Point::new(4.0, 3.0),
            Point::new(15.0, 3.0),
            Point::new(4.0, 7.0),
            Point::new(15.0, 7.0),
        ] {
            assert!(
                contour.points().contains(&corner),
                "missing corner {corner:?} in {contour:?}"
            );
        }
    }

    #[test]
    fn coordinates_are_region_relative() {
        let sampler = sampler_from_fn(20, 20, |x, y| (12..14).contains(&x) && (12..14).contains(&y));
        let contour = trace(&sampler, Region::new(10, 10, 10, 10), 0).unwrap();
        assert_eq!(contour.len(), 4);
        assert!(contour.points().contains(&Point::new(2.0, 2.0)));
        assert!(contour.points().contains(&Point::new(4.0, 4.0)));
    }

    #[test]
    fn single_pixel_traces_unit_square() {
        let sampler = sampler_from_fn(5, 5, |x, y| (x, y) == (2, 2));
        let contour = trace(&sampler, Region::new(0, 0, 5, 5), 0).unwrap();
        assert_eq!(
            contour.points(),
            &[
                Point::new(2.0, 3.0),
                Point::new(3.0, 3.0),
                Point::new(3.0, 2.0),
                Point::new(2.0, 2.0),
            ]
        );
    }

    #[test]
    fn l_shape_traces_six_corners() {
        // ##..
        // ##..
        // ####
        let sampler = sampler_from_fn(8, 8, |x, y| {
            ((1..3).contains(&x) && (1..4).contains(&y)) || ((1..5).contains(&x) && y == 3)
        });
        let contour = trace(&sampler, Region::new(0, 0, 8, 8), 0).unwrap();
        assert_eq!(contour.len(), 6);
    }

    #[test]
    fn diagonal_saddle_terminates() {
        // Two pixels touching only at a corner produce square value 9
        // at the shared corner; the tracer must still close.
        //
        // #.
        // .#
        let sampler = sampler_from_fn(6, 6, |x, y| (x, y) == (1, 1) || (x, y) == (2, 2));
        let contour = trace(&sampler, Region::new(0, 0, 6, 6), 0).unwrap();
        assert!(contour.len() >= 4);
        assert_eq!(contour.last(), Some(&Point::new(1.0, 1.0)));
    }

    #[test]
    fn anti_diagonal_saddle_terminates() {
        // .#
        // #.
        let sampler = sampler_from_fn(6, 6, |x, y| (x, y) == (2, 1) || (x, y) == (1, 2));
        let contour = trace(&sampler, Region::new(0, 0, 6, 6), 0).unwrap();
        assert!(contour.len() >= 4);
    }

    #[test]
    fn threshold_is_exclusive() {
        let sampler = AlphaSampler::from_alpha(GrayImage::from_fn(6, 6, |x, y| {
            Luma([if (1..3).contains(&x) && (1..3).contains(&y) { 128 } else { 0 }])
        }));
        let region = Region::new(0, 0, 6, 6);
        assert!(trace(&sampler, region, 128).unwrap().is_empty());
        assert_eq!(trace(&sampler, region, 127).unwrap().len(), 4);
    }

    #[test]
    fn last_column_is_outside_sampling_window() {
        // Only the last column is opaque: the shrunk window sees nothing.
        let sampler = sampler_from_fn(6, 6, |x, _| x == 5);
        let contour = trace(&sampler, Region::new(0, 0, 6, 6), 0).unwrap();
        assert!(contour.is_empty());
    }

    #[test]
    fn edge_touching_blob_is_clipped_to_window() {
        // Opaque everywhere: the window covers (0..5, 0..5).
        let sampler = sampler_from_fn(6, 6, |_, _| true);
        let contour = trace(&sampler, Region::new(0, 0, 6, 6), 0).unwrap();
        assert_eq!(
            contour.points(),
            &[
                Point::new(0.0, 5.0),
                Point::new(5.0, 5.0),
                Point::new(5.0, 0.0),
                Point::new(0.0, 0.0),
            ]
        );
    }

    #[test]
    fn seed_in_empty_space_is_invalid() {
        let sampler = sampler_from_fn(10, 10, |_, _| false);
        let result = march(&sampler, Region::new(0, 0, 10, 10), (4, 4), 0);
        assert!(matches!(
            result,
            Err(HullError::InvalidSquare {
                value: 0,
                x: 4,
                y: 4,
                ..
            })
        ));
    }

    #[test]
    fn seed_inside_solid_block_is_invalid() {
        let sampler = sampler_from_fn(10, 10, |_, _| true);
        let result = march(&sampler, Region::new(0, 0, 10, 10), (4, 4), 0);
        assert!(matches!(
            result,
            Err(HullError::InvalidSquare { value: 15, .. })
        ));
    }

    #[test]
    fn walk_longer_than_limit_is_runaway() {
        // The bordered square needs 32 unit steps to close.
        let sampler = sampler_from_fn(10, 10, |x, y| (1..9).contains(&x) && (1..9).contains(&y));
        let region = Region::new(0, 0, 10, 10);

        assert!(march_with_limit(&sampler, region, (1, 1), 0, 32).is_ok());
        assert!(matches!(
            march_with_limit(&sampler, region, (1, 1), 7, 31),
            Err(HullError::TraceRunaway {
                limit: 31,
                threshold: 7,
                ..
            })
        ));
    }

    #[test]
    fn square_value_bits() {
        let sampler = sampler_from_fn(4, 4, |x, y| (x, y) == (1, 1));
        let window = Region::new(0, 0, 3, 3);
        // Pixel (1, 1) is bottom-right of lattice point (1, 1).
        assert_eq!(square_value(&sampler, window, (1, 1), 0), 8);
        assert_eq!(square_value(&sampler, window, (2, 1), 0), 4);
        assert_eq!(square_value(&sampler, window, (1, 2), 0), 2);
        assert_eq!(square_value(&sampler, window, (2, 2), 0), 1);
        assert_eq!(square_value(&sampler, window, (0, 0), 0), 0);
    }

    #[test]
    fn sampling_window_shrinks_far_edges() {
        assert_eq!(
            sampling_window(Region::new(3, 4, 10, 20)),
            Region::new(3, 4, 9, 19)
        );
    }
}
