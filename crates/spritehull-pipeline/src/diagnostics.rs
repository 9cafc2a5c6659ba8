//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! These diagnostics are permanent instrumentation intended for tuning
//! `epsilon` and `threshold` against real sprites. Call
//! [`generate_with_diagnostics`] to collect them alongside the mesh.
//!
//! Duration measurements use [`std::time::Duration`]. Timestamps come
//! from a caller-supplied [`Clock`], so this crate never reads the
//! system time itself.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::mesh::HullMesh;
use crate::pipeline::Pipeline;
use crate::types::{HullConfig, HullError, Region, RgbaImage};

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite and non-negative",
            )
        })
    }
}

/// Source of timestamps for stage timing.
pub trait Clock {
    /// An opaque point in time.
    type Instant;

    /// The current time.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HullDiagnostics {
    /// Stage 1: discovery of the largest loop.
    pub discovery: StageDiagnostics,
    /// Stage 2: extraction of hull polygons.
    pub extraction: StageDiagnostics,
    /// Stage 3: triangulation and merge.
    pub triangulation: StageDiagnostics,
    /// Stage 4: texture coordinate assignment.
    pub uv_mapping: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: HullSummary,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics (counts, sizes, etc.).
    pub metrics: StageMetrics,
}

/// Stage-specific metrics that vary by pipeline stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Discovery metrics.
    Discovery {
        /// Number of loops traced and erased.
        loop_count: usize,
        /// Points in the largest loop.
        largest_loop_points: usize,
        /// Erase stroke width in pixels.
        stroke_width: f64,
        /// Pixels in the region above the alpha threshold.
        opaque_pixels: u64,
    },
    /// Extraction metrics.
    Extraction {
        /// Number of loops traced and erased.
        traced_count: usize,
        /// Total points across traced loops.
        traced_points: usize,
        /// Total points after simplification.
        simplified_points: usize,
        /// Number of hull polygons kept.
        polygon_count: usize,
        /// Total points across kept hull polygons.
        polygon_points: usize,
        /// Number of polygons dropped by the nested policy.
        absorbed_count: usize,
        /// Erase stroke width in pixels.
        stroke_width: f64,
    },
    /// Triangulation metrics.
    Triangulation {
        /// Triangulator name.
        strategy: String,
        /// Number of polygons triangulated.
        polygon_count: usize,
        /// Vertices in the merged mesh.
        vertex_count: usize,
        /// Triangles in the merged mesh.
        triangle_count: usize,
    },
    /// UV mapping metrics.
    UvMapping {
        /// Vertices that received texture coordinates.
        vertex_count: usize,
        /// Source image width in pixels.
        image_width: u32,
        /// Source image height in pixels.
        image_height: u32,
    },
}

/// Summary of a pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HullSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// The meshed region.
    pub region: Region,
    /// Vertices in the final mesh.
    pub vertex_count: usize,
    /// Triangles in the final mesh.
    pub triangle_count: usize,
    /// Total mesh area in square pixels.
    pub hull_area: f64,
    /// Mesh area as a fraction of the region area.
    pub coverage_ratio: f64,
}

/// Run the staged pipeline, timing every stage.
///
/// Returns the same mesh as [`generate_mesh`](crate::generate_mesh)
/// together with per-stage diagnostics.
///
/// # Errors
///
/// Returns the first [`HullError`] any stage produces.
pub fn generate_with_diagnostics<C: Clock>(
    image: &RgbaImage,
    region: Region,
    config: &HullConfig,
    clock: &C,
) -> Result<(HullMesh, HullDiagnostics), HullError> {
    let total_start = clock.now();

    let start = clock.now();
    let discovered = Pipeline::new(image, region, config.clone()).discover()?;
    let discovery = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: discovered.metrics(),
    };

    let start = clock.now();
    let extracted = discovered.extract()?;
    let extraction = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: extracted.metrics(),
    };

    let start = clock.now();
    let triangulated = extracted.triangulate();
    let triangulation = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: triangulated.metrics(),
    };

    let start = clock.now();
    let mapped = triangulated.map_uvs();
    let uv_mapping = StageDiagnostics {
        duration: clock.elapsed(&start),
        metrics: mapped.metrics(),
    };

    let total_duration = clock.elapsed(&total_start);
    let dimensions = mapped.dimensions();
    let mesh = mapped.into_mesh();
    let hull_area = mesh.area();
    let region_area = region.area();

    let summary = HullSummary {
        image_width: dimensions.width,
        image_height: dimensions.height,
        region,
        vertex_count: mesh.vertices.len(),
        triangle_count: mesh.triangle_count(),
        hull_area,
        coverage_ratio: if region_area > 0.0 {
            hull_area / region_area
        } else {
            0.0
        },
    };

    let diagnostics = HullDiagnostics {
        discovery,
        extraction,
        triangulation,
        uv_mapping,
        total_duration,
        summary,
    };
    Ok((mesh, diagnostics))
}

impl HullDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Hull Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{}  Region: {}",
            self.summary.image_width, self.summary.image_height, self.summary.region,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);

        for (name, diag) in self.stages() {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<24} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Triangles: {}  |  Vertices: {}  |  Coverage: {:.1}%",
            self.summary.triangle_count,
            self.summary.vertex_count,
            self.summary.coverage_ratio * 100.0,
        ));

        lines.join("\n")
    }

    /// Every stage with its display name, in pipeline order.
    #[must_use]
    pub fn stages(&self) -> [(&'static str, &StageDiagnostics); 4] {
        [
            ("Discovery", &self.discovery),
            ("Extraction", &self.extraction),
            ("Triangulation", &self.triangulation),
            ("UV Mapping", &self.uv_mapping),
        ]
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Discovery {
            loop_count,
            largest_loop_points,
            stroke_width,
            opaque_pixels,
        } => format!(
            "{loop_count} loops, largest {largest_loop_points} pts, stroke={stroke_width:.1} opaque={opaque_pixels}",
        ),
        StageMetrics::Extraction {
            traced_count,
            traced_points,
            simplified_points,
            polygon_count,
            polygon_points,
            absorbed_count,
            ..
        } => format!(
            "{traced_count} loops, {traced_points}->{simplified_points}->{polygon_points} pts, {polygon_count} polys ({absorbed_count} absorbed)",
        ),
        StageMetrics::Triangulation {
            strategy,
            polygon_count,
            vertex_count,
            triangle_count,
        } => format!(
            "{strategy} {polygon_count} polys -> {triangle_count} tris, {vertex_count} verts",
        ),
        StageMetrics::UvMapping {
            vertex_count,
            image_width,
            image_height,
        } => format!("{vertex_count} verts into {image_width}x{image_height}"),
    }
}
