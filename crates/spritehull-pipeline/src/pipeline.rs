//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::generate_mesh`] which runs every stage in one call,
//! [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use spritehull_pipeline::{HullConfig, HullError, Pipeline, Region, RgbaImage};
//! # fn run(image: &RgbaImage) -> Result<(), HullError> {
//! let region = Region::new(0, 0, image.width(), image.height());
//! let mesh = Pipeline::new(image, region, HullConfig::default())
//!     .discover()?
//!     .extract()?
//!     .triangulate()
//!     .map_uvs()
//!     .into_mesh();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline state
//! (or `Result` for fallible stages). The caller can inspect the current
//! stage's output via accessor methods at any point.
//!
//! # Erasure
//!
//! Discovery and extraction never touch the source alpha plane. Each
//! runs on its own clone, painting every traced contour transparent so
//! the next trace finds the next blob. Discovery only looks for the
//! loop with the most points. Extraction restarts from a fresh clone at
//! that loop, erasing more aggressively, and turns every loop it traces
//! into a hull polygon.

use crate::contour;
use crate::diagnostics::StageMetrics;
use crate::mesh::HullMesh;
use crate::reconcile;
use crate::sampler::AlphaSampler;
use crate::simplify;
use crate::triangulate::Triangulator;
use crate::types::{Contour, Dimensions, HullConfig, HullError, Region, RgbaImage};
use crate::uv;

/// Minimum erase stroke width during discovery, in pixels.
pub const DISCOVERY_MIN_STROKE: f64 = 2.0;

/// Minimum erase stroke width during extraction, in pixels.
pub const EXTRACTION_MIN_STROKE: f64 = 10.0;

/// Stop an erase-and-retrace loop that has run more iterations than the
/// region has pixels.
fn check_progress(iterations: u64, region: Region, threshold: u8) -> Result<(), HullError> {
    if iterations > region.pixel_count() {
        return Err(HullError::ErasureStalled { region, threshold });
    }
    Ok(())
}

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any tracing has occurred.
///
/// Holds the source alpha plane, the region, and the config. Call
/// [`discover`](Self::discover) to advance.
#[must_use = "pipeline stages are consumed by advancing; call .discover() to continue"]
pub struct Pending {
    config: HullConfig,
    region: Region,
    source: AlphaSampler,
}

impl Pending {
    /// The source alpha plane.
    #[must_use]
    pub const fn source(&self) -> &AlphaSampler {
        &self.source
    }

    /// The region being meshed.
    #[must_use]
    pub const fn region(&self) -> Region {
        self.region
    }

    /// Find the traced loop with the most points and advance to the
    /// [`Discovered`] stage.
    ///
    /// Traces the region repeatedly on a working copy, erasing each loop
    /// with a stroke of `max(epsilon, 2)` pixels, until a trace yields
    /// fewer than 3 points. Ties keep the earlier loop.
    ///
    /// # Errors
    ///
    /// Returns [`HullError::InvalidConfig`] or [`HullError::InvalidRegion`]
    /// when the inputs are unusable, any tracing error from
    /// [`contour::trace`], and [`HullError::ErasureStalled`] when erasure
    /// stops removing loops.
    pub fn discover(self) -> Result<Discovered, HullError> {
        self.config.validate()?;
        self.region.validate(self.source.dimensions())?;

        let threshold = self.config.threshold;
        let stroke_width = self.config.epsilon.max(DISCOVERY_MIN_STROKE);
        let mut working = self.source.clone();
        let mut largest = Contour::default();
        let mut loop_count = 0;
        let mut iterations: u64 = 0;

        loop {
            let traced = contour::trace(&working, self.region, threshold)?;
            if traced.len() < 3 {
                break;
            }
            iterations += 1;
            check_progress(iterations, self.region, threshold)?;

            loop_count += 1;
            working.erase_contour(&traced, self.region, stroke_width, threshold);
            if traced.len() > largest.len() {
                largest = traced;
            }
        }

        log::debug!(
            "discovered {loop_count} loops in region {}, largest has {} points",
            self.region,
            largest.len()
        );

        Ok(Discovered {
            opaque_pixels: self.source.count_opaque_in(self.region, threshold),
            config: self.config,
            region: self.region,
            source: self.source,
            largest,
            loop_count,
            stroke_width,
        })
    }
}

// ───────────────────────── Stage 1: Discovered ───────────────────────

/// Pipeline state after discovery.
///
/// Call [`extract`](Self::extract) to advance.
#[must_use = "pipeline stages are consumed by advancing; call .extract() to continue"]
pub struct Discovered {
    config: HullConfig,
    region: Region,
    source: AlphaSampler,
    largest: Contour,
    loop_count: usize,
    stroke_width: f64,
    opaque_pixels: u64,
}

impl Discovered {
    /// The traced loop with the most points. Empty when the region has
    /// no shape.
    #[must_use]
    pub const fn largest(&self) -> &Contour {
        &self.largest
    }

    /// Number of loops traced during discovery.
    #[must_use]
    pub const fn loop_count(&self) -> usize {
        self.loop_count
    }

    /// Discovery metrics.
    #[must_use]
    pub const fn metrics(&self) -> StageMetrics {
        StageMetrics::Discovery {
            loop_count: self.loop_count,
            largest_loop_points: self.largest.len(),
            stroke_width: self.stroke_width,
            opaque_pixels: self.opaque_pixels,
        }
    }

    /// Turn every loop into a hull polygon and advance to the
    /// [`Extracted`] stage.
    ///
    /// Starting from the largest discovered loop on a fresh working
    /// copy, each loop is erased with a stroke of `max(2 * epsilon, 10)`
    /// pixels, simplified, expanded by `epsilon` and clamped to the
    /// region. Polygons that survive with at least 3 points are recorded
    /// and the next loop is traced. The configured
    /// [`NestedPolicy`](crate::NestedPolicy) is applied to the result.
    ///
    /// # Errors
    ///
    /// Returns any tracing error from [`contour::trace`] and
    /// [`HullError::ErasureStalled`] when erasure stops removing loops.
    pub fn extract(self) -> Result<Extracted, HullError> {
        let threshold = self.config.threshold;
        let epsilon = self.config.epsilon;
        let stroke_width = (2.0 * epsilon).max(EXTRACTION_MIN_STROKE);

        let mut polygons = Vec::new();
        let mut traced_count = 0;
        let mut traced_points = 0;
        let mut simplified_points = 0;

        if self.largest.len() >= 3 {
            let mut working = self.source.clone();
            let mut traced = self.largest.clone();
            let mut iterations: u64 = 0;

            loop {
                iterations += 1;
                check_progress(iterations, self.region, threshold)?;

                working.erase_contour(&traced, self.region, stroke_width, threshold);
                traced_count += 1;
                traced_points += traced.len();

                let simplified = simplify::reduce(&traced, self.region, epsilon);
                simplified_points += simplified.len();

                let hull = reconcile::expand(&simplified, self.region, epsilon);
                if hull.len() >= 3 {
                    polygons.push(hull);
                }

                traced = contour::trace(&working, self.region, threshold)?;
                if traced.len() < 3 {
                    break;
                }
            }
        }

        let recorded = polygons.len();
        let polygons = self.config.nested_policy.apply(polygons);
        log::debug!(
            "extracted {} hull polygons from {traced_count} loops ({} absorbed)",
            polygons.len(),
            recorded - polygons.len()
        );

        Ok(Extracted {
            dimensions: self.source.dimensions(),
            config: self.config,
            region: self.region,
            absorbed_count: recorded - polygons.len(),
            polygons,
            traced_count,
            traced_points,
            simplified_points,
            stroke_width,
        })
    }
}

// ───────────────────────── Stage 2: Extracted ────────────────────────

/// Pipeline state after hull polygon extraction.
///
/// Call [`triangulate`](Self::triangulate) to advance.
#[must_use = "pipeline stages are consumed by advancing; call .triangulate() to continue"]
pub struct Extracted {
    config: HullConfig,
    region: Region,
    dimensions: Dimensions,
    polygons: Vec<Contour>,
    traced_count: usize,
    traced_points: usize,
    simplified_points: usize,
    absorbed_count: usize,
    stroke_width: f64,
}

impl Extracted {
    /// The recorded hull polygons, in region-relative pixels.
    #[must_use]
    pub fn polygons(&self) -> &[Contour] {
        &self.polygons
    }

    /// Extraction metrics.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Extraction {
            traced_count: self.traced_count,
            traced_points: self.traced_points,
            simplified_points: self.simplified_points,
            polygon_count: self.polygons.len(),
            polygon_points: self.polygons.iter().map(Contour::len).sum(),
            absorbed_count: self.absorbed_count,
            stroke_width: self.stroke_width,
        }
    }

    /// Triangulate every polygon, merge the fragments, and advance to
    /// the [`Triangulated`] stage.
    pub fn triangulate(self) -> Triangulated {
        let mut mesh = HullMesh::default();
        for polygon in &self.polygons {
            let fragment = self.config.triangulator.triangulate(polygon);
            mesh.append(&fragment);
        }
        mesh.debug_points = self
            .polygons
            .iter()
            .flat_map(|p| p.points().iter().copied())
            .collect();

        Triangulated {
            config: self.config,
            region: self.region,
            dimensions: self.dimensions,
            polygons: self.polygons,
            mesh,
        }
    }
}

// ───────────────────────── Stage 3: Triangulated ─────────────────────

/// Pipeline state after triangulation. Vertex UVs are still zero.
///
/// Call [`map_uvs`](Self::map_uvs) to advance.
#[must_use = "pipeline stages are consumed by advancing; call .map_uvs() to continue"]
pub struct Triangulated {
    config: HullConfig,
    region: Region,
    dimensions: Dimensions,
    polygons: Vec<Contour>,
    mesh: HullMesh,
}

impl Triangulated {
    /// The merged mesh, without texture coordinates.
    #[must_use]
    pub const fn mesh(&self) -> &HullMesh {
        &self.mesh
    }

    /// Triangulation metrics.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        StageMetrics::Triangulation {
            strategy: format!("{:?}", self.config.triangulator),
            polygon_count: self.polygons.len(),
            vertex_count: self.mesh.vertices.len(),
            triangle_count: self.mesh.triangle_count(),
        }
    }

    /// Assign texture coordinates and advance to the final [`Mapped`]
    /// stage.
    pub fn map_uvs(mut self) -> Mapped {
        uv::map_uvs(&mut self.mesh, self.region, self.dimensions);
        Mapped {
            region: self.region,
            dimensions: self.dimensions,
            mesh: self.mesh,
        }
    }
}

// ───────────────────────── Stage 4: Mapped ───────────────────────────

/// Final pipeline state: a complete mesh with texture coordinates.
#[must_use = "call .into_mesh() to extract the HullMesh"]
pub struct Mapped {
    region: Region,
    dimensions: Dimensions,
    mesh: HullMesh,
}

impl Mapped {
    /// The finished mesh.
    #[must_use]
    pub const fn mesh(&self) -> &HullMesh {
        &self.mesh
    }

    /// The meshed region.
    #[must_use]
    pub const fn region(&self) -> Region {
        self.region
    }

    /// Source image dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// UV mapping metrics.
    #[must_use]
    pub const fn metrics(&self) -> StageMetrics {
        StageMetrics::UvMapping {
            vertex_count: self.mesh.vertices.len(),
            image_width: self.dimensions.width,
            image_height: self.dimensions.height,
        }
    }

    /// Consume the pipeline and return the mesh.
    #[must_use]
    pub fn into_mesh(self) -> HullMesh {
        self.mesh
    }
}

// ───────────────────────── Entry point ───────────────────────────────

/// Entry point for the staged hull pipeline.
///
/// ```rust
/// # use spritehull_pipeline::{HullConfig, HullError, Pipeline, Region, RgbaImage};
/// # fn run(image: &RgbaImage) -> Result<(), HullError> {
/// let discovered = Pipeline::new(image, Region::new(0, 0, 16, 16), HullConfig::default())
///     .discover()?;
/// println!("{} loops", discovered.loop_count());
/// # Ok(())
/// # }
/// ```
///
/// Each stage method consumes the current state and returns the next,
/// making it a compile-time error to skip stages or call them out of
/// order.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline over `region` of `image`.
    ///
    /// Only the alpha channel is kept. Nothing is validated or traced
    /// until [`.discover()`](Pending::discover).
    #[allow(clippy::new_ret_no_self)]
    pub fn new(image: &RgbaImage, region: Region, config: HullConfig) -> Pending {
        Pending {
            config,
            region,
            source: AlphaSampler::from_rgba(image),
        }
    }
}
