//! Texture coordinate assignment.

use crate::mesh::{HullMesh, TexCoord};
use crate::types::{Dimensions, Region};

/// Give every vertex a normalized texture coordinate into the full
/// source image.
///
/// `u` grows left to right and `v` grows bottom to top:
///
/// ```text
/// u = (x + region.left) / image_width
/// v = (region.top + region.height - y) / image_height
/// ```
///
/// Only UVs change; positions and indices are left alone. Degenerate
/// (zero-sized) images leave the mesh untouched.
pub fn map_uvs(mesh: &mut HullMesh, region: Region, dimensions: Dimensions) {
    if dimensions.width == 0 || dimensions.height == 0 {
        return;
    }
    let width = f64::from(dimensions.width);
    let height = f64::from(dimensions.height);
    let left = f64::from(region.left);
    let bottom = f64::from(region.top) + f64::from(region.height);

    for vertex in &mut mesh.vertices {
        vertex.uv = TexCoord {
            u: (vertex.position.x + left) / width,
            v: (bottom - vertex.position.y) / height,
        };
    }
}
