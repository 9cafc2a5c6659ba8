//! spritehull-pipeline: Sprite hull extraction pipeline (sans-IO).
//!
//! Turns the opaque part of a sprite into a tight triangle mesh through:
//! alpha sampling -> contour tracing -> simplification ->
//! expansion and clamping -> triangulation -> UV mapping.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! images and byte slices and returns structured data. Reading files,
//! writing SVG and timing live in the other workspace crates.

pub mod contour;
pub mod decode;
pub mod diagnostics;
pub mod mesh;
pub mod pipeline;
pub mod reconcile;
pub mod sampler;
pub mod simplify;
pub mod triangulate;
pub mod types;
pub mod uv;

pub use mesh::{HullMesh, MeshFragment, TexCoord, Vertex};
pub use pipeline::Pipeline;
pub use reconcile::NestedPolicy;
pub use sampler::AlphaSampler;
pub use triangulate::{Triangulator, TriangulatorKind};
pub use types::{Contour, Dimensions, HullConfig, HullError, Point, Region, RgbaImage};

/// Build the hull mesh for `region` of `image`.
///
/// # Pipeline steps
///
/// 1. Discovery: trace and erase every loop, keeping the largest
/// 2. Extraction: from the largest loop, trace, erase, simplify, and
///    expand every loop into a hull polygon
/// 3. Triangulation of every hull polygon into one merged mesh
/// 4. UV mapping into the full image
///
/// A fully transparent region is not an error: it yields an empty mesh.
///
/// # Errors
///
/// Returns [`HullError::InvalidConfig`] for a negative or non-finite
/// epsilon, [`HullError::InvalidRegion`] for a region that is empty or
/// leaves the image, and [`HullError::InvalidSquare`],
/// [`HullError::TraceRunaway`] or [`HullError::ErasureStalled`] when
/// tracing breaks down.
pub fn generate_mesh(
    image: &RgbaImage,
    region: Region,
    config: &HullConfig,
) -> Result<HullMesh, HullError> {
    let mesh = Pipeline::new(image, region, config.clone())
        .discover()?
        .extract()?
        .triangulate()
        .map_uvs()
        .into_mesh();
    log::debug!(
        "region {region}: {} triangles, {} vertices",
        mesh.triangle_count(),
        mesh.vertices.len()
    );
    Ok(mesh)
}

/// Decode `image_bytes` and build the hull mesh for the whole image.
///
/// # Errors
///
/// Returns [`HullError::EmptyInput`] or [`HullError::ImageDecode`]
/// when decoding fails, and otherwise the same errors as
/// [`generate_mesh`].
pub fn generate_mesh_from_bytes(
    image_bytes: &[u8],
    config: &HullConfig,
) -> Result<HullMesh, HullError> {
    let image = decode::decode_rgba(image_bytes)?;
    let region = Region::new(0, 0, image.width(), image.height());
    generate_mesh(&image, region, config)
}
