//! Indexed triangle meshes.
//!
//! The triangulator emits one [`MeshFragment`] per hull polygon. The
//! pipeline merges fragments into a single [`HullMesh`], whose vertices
//! then receive texture coordinates.

use serde::{Deserialize, Serialize};

use crate::types::Point;

/// Normalized texture coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TexCoord {
    /// Horizontal coordinate, 0 at the image's left edge.
    pub u: f64,
    /// Vertical coordinate, 0 at the image's bottom edge.
    pub v: f64,
}

/// A mesh vertex: a region-relative position plus its texture
/// coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Position in region-relative pixels.
    pub position: Point,
    /// Texture coordinate. Zero until UVs are mapped.
    pub uv: TexCoord,
}

impl Vertex {
    /// A vertex at `position` with a placeholder texture coordinate.
    #[must_use]
    pub fn at(position: Point) -> Self {
        Self {
            position,
            uv: TexCoord::default(),
        }
    }
}

/// The triangulation of a single hull polygon.
///
/// `vertices` has no two equal positions; `indices` holds triples into
/// `vertices`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshFragment {
    /// Unique vertex positions.
    pub vertices: Vec<Point>,
    /// Triangle corner indices, three per triangle.
    pub indices: Vec<u32>,
}

impl MeshFragment {
    /// Whether the fragment has no triangles.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Append a triangle, reusing an existing vertex slot for any corner
    /// whose position is already present.
    pub fn push_triangle(&mut self, corners: [Point; 3]) {
        for corner in corners {
            let index = slot_for(&mut self.vertices, corner, |p| *p, |p| p);
            self.indices.push(index);
        }
    }
}

/// The merged output mesh for one region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HullMesh {
    /// Deduplicated vertices.
    pub vertices: Vec<Vertex>,
    /// Triangle corner indices, three per triangle, each below
    /// `vertices.len()`.
    pub indices: Vec<u32>,
    /// The recorded hull polygons, concatenated, for debugging overlays.
    pub debug_points: Vec<Point>,
}

impl HullMesh {
    /// Whether the mesh has no triangles.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of triangles.
    #[must_use]
    pub const fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Merge a fragment into the mesh.
    ///
    /// Each fragment vertex maps onto an existing vertex with an equal
    /// position if there is one, and onto a new vertex with a
    /// placeholder UV otherwise.
    pub fn append(&mut self, fragment: &MeshFragment) {
        let remap: Vec<u32> = fragment
            .vertices
            .iter()
            .map(|&p| slot_for(&mut self.vertices, p, |v| v.position, Vertex::at))
            .collect();
        self.indices.extend(
            fragment
                .indices
                .iter()
                .filter_map(|&i| remap.get(i as usize).copied()),
        );
    }

    /// Triangle corners by position.
    pub fn triangles(&self) -> impl Iterator<Item = [Point; 3]> + '_ {
        self.indices.chunks_exact(3).filter_map(|tri| {
            let corner = |i: u32| self.vertices.get(i as usize).map(|v| v.position);
            Some([corner(tri[0])?, corner(tri[1])?, corner(tri[2])?])
        })
    }

    /// Total triangle area in square pixels.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.triangles().map(|[a, b, c]| triangle_area(a, b, c)).sum()
    }

    /// Whether every index refers to a vertex and the index count is a
    /// multiple of three.
    #[must_use]
    pub fn indices_valid(&self) -> bool {
        self.indices.len() % 3 == 0
            && self
                .indices
                .iter()
                .all(|&i| (i as usize) < self.vertices.len())
    }
}

/// Unsigned area of a triangle.
#[must_use]
pub fn triangle_area(a: Point, b: Point, c: Point) -> f64 {
    ((b.x - a.x).mul_add(c.y - a.y, -(c.x - a.x) * (b.y - a.y)) / 2.0).abs()
}

/// Index of the first element whose position equals `position`,
/// appending a new element when there is none. Linear scan.
#[allow(clippy::cast_possible_truncation)]
fn slot_for<T>(
    items: &mut Vec<T>,
    position: Point,
    position_of: impl Fn(&T) -> Point,
    make: impl FnOnce(Point) -> T,
) -> u32 {
    items
        .iter()
        .position(|item| position_of(item) == position)
        .unwrap_or_else(|| {
            items.push(make(position));
            items.len() - 1
        }) as u32
}
