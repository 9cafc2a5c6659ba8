//! Polygon triangulation.
//!
//! This module defines the [`Triangulator`] trait for triangulation
//! strategies and the [`TriangulatorKind`] enum for selecting one at
//! runtime. Both strategies triangulate the interior of a simple polygon
//! and emit a deduplicated [`MeshFragment`].

use geo::algorithm::triangulate_spade::SpadeTriangulationConfig;
use geo::{Coord, LineString, Polygon, Triangle, TriangulateEarcut, TriangulateSpade};
use serde::{Deserialize, Serialize};

use crate::mesh::MeshFragment;
use crate::types::{Contour, Point};

/// Selects which triangulation algorithm to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriangulatorKind {
    /// Constrained Delaunay triangulation via `spade`.
    ///
    /// Polygon edges are constraints; only interior triangles are kept.
    /// Avoids slivers where it can.
    #[default]
    ConstrainedDelaunay,

    /// Ear clipping via `earcutr`.
    ///
    /// Faster, but happily produces long thin triangles.
    Earcut,
}

/// Trait for triangulation strategies.
///
/// Input: a simple polygon as a closed contour without a repeated
/// closing point.
/// Output: an indexed triangle fragment with unique vertex positions.
pub trait Triangulator {
    /// Triangulate the interior of `polygon`.
    fn triangulate(&self, polygon: &Contour) -> MeshFragment;
}

impl Triangulator for TriangulatorKind {
    fn triangulate(&self, polygon: &Contour) -> MeshFragment {
        if polygon.len() < 3 {
            log::debug!("polygon with {} points has no interior", polygon.len());
            return MeshFragment::default();
        }

        let shape = to_geo_polygon(polygon);
        let triangles = match *self {
            Self::ConstrainedDelaunay => {
                match shape.constrained_triangulation(SpadeTriangulationConfig::default()) {
                    Ok(triangles) => triangles,
                    Err(e) => {
                        log::warn!(
                            "constrained triangulation of {}-point polygon failed: {e:?}",
                            polygon.len()
                        );
                        return MeshFragment::default();
                    }
                }
            }
            Self::Earcut => shape.earcut_triangles(),
        };

        fragment_from_triangles(&triangles)
    }
}

fn to_geo_polygon(polygon: &Contour) -> Polygon<f64> {
    let ring: Vec<Coord<f64>> = polygon
        .points()
        .iter()
        .map(|p| Coord { x: p.x, y: p.y })
        .collect();
    Polygon::new(LineString::from(ring), vec![])
}

/// Build a fragment, looking each corner up by exact position among the
/// vertices already emitted.
fn fragment_from_triangles(triangles: &[Triangle<f64>]) -> MeshFragment {
    let mut fragment = MeshFragment::default();
    for triangle in triangles {
        let [a, b, c] = triangle.to_array();
        fragment.push_triangle([
            Point::new(a.x, a.y),
            Point::new(b.x, b.y),
            Point::new(c.x, c.y),
        ]);
    }
    fragment
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::triangle_area;

    fn contour(points: &[(f64, f64)]) -> Contour {
        Contour::new(points.iter().map(|&(x, y)| Point::new(x, y)).collect())
    }

    fn fragment_area(fragment: &MeshFragment) -> f64 {
        fragment
            .indices
            .chunks_exact(3)
            .map(|t| {
                let v = |i: u32| fragment.vertices[i as usize];
                triangle_area(v(t[0]), v(t[1]), v(t[2]))
            })
            .sum()
    }

    const ALL: [TriangulatorKind; 2] = [TriangulatorKind::ConstrainedDelaunay, TriangulatorKind::Earcut];

    #[test]
    fn default_is_constrained_delaunay() {
        assert_eq!(TriangulatorKind::default(), TriangulatorKind::ConstrainedDelaunay);
    }

    #[test]
    fn too_few_points_gives_empty_fragment() {
        for kind in ALL {
            let fragment = kind.triangulate(&contour(&[(0.0, 0.0), (1.0, 1.0)]));
            assert!(fragment.is_empty(), "{kind:?}");
            assert!(fragment.vertices.is_empty(), "{kind:?}");
        }
    }

    #[test]
    fn square_gives_two_triangles_four_vertices() {
        let square = contour(&[(1.0, 9.0), (9.0, 9.0), (9.0, 1.0), (1.0, 1.0)]);
        for kind in ALL {
            let fragment = kind.triangulate(&square);
            assert_eq!(fragment.indices.len(), 6, "{kind:?}");
            assert_eq!(fragment.vertices.len(), 4, "{kind:?}");
            assert!((fragment_area(&fragment) - 64.0).abs() < 1e-9, "{kind:?}");
        }
    }

    #[test]
    fn concave_polygon_area_is_preserved() {
        // L shape: 4x4 square minus its top-right 2x2 quadrant.
        let l_shape = contour(&[
            (0.0, 0.0),
            (2.0, 0.0),
            (2.0, 2.0),
            (4.0, 2.0),
            (4.0, 4.0),
            (0.0, 4.0),
        ]);
        for kind in ALL {
            let fragment = kind.triangulate(&l_shape);
            assert_eq!(fragment.indices.len(), 12, "{kind:?}");
            assert_eq!(fragment.vertices.len(), 6, "{kind:?}");
            assert!((fragment_area(&fragment) - 12.0).abs() < 1e-9, "{kind:?}");
        }
    }

    #[test]
    fn indices_reference_unique_vertices() {
        let hexagon = contour(&[
            (2.0, 0.0),
            (4.0, 1.0),
            (4.0, 3.0),
            (2.0, 4.0),
            (0.0, 3.0),
            (0.0, 1.0),
        ]);
        for kind in ALL {
            let fragment = kind.triangulate(&hexagon);
            assert!(fragment.indices.iter().all(|&i| (i as usize) < fragment.vertices.len()));
            for (i, a) in fragment.vertices.iter().enumerate() {
                assert!(!fragment.vertices[i + 1..].contains(a), "{kind:?} duplicated {a:?}");
            }
        }
    }

    #[test]
    fn kind_serde_names() {
        #[allow(clippy::unwrap_used)]
        let json = serde_json::to_string(&TriangulatorKind::ConstrainedDelaunay).unwrap();
        assert_eq!(json, "\"constrained_delaunay\"");
    }
}
