//! Shared types for the spritehull extraction pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::reconcile::NestedPolicy;
use crate::triangulate::TriangulatorKind;

/// Re-export `RgbaImage` so downstream crates can hand decoded sprites
/// to the pipeline without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point in region-local pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from the region's left edge).
    pub x: f64,
    /// Vertical position (pixels from the region's top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Manhattan (taxicab) distance to another point.
    #[must_use]
    pub fn manhattan_distance(self, other: Self) -> f64 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Squared Euclidean distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }
}

/// A closed loop of points. The last point implicitly connects back to
/// the first.
///
/// Every pipeline stage borrows a contour and returns a new one; nothing
/// mutates a contour across stages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contour(Vec<Point>);

impl Contour {
    /// Create a new contour from a vector of points.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the contour has no points.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of points in the contour.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns the first point, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Point> {
        self.0.first()
    }

    /// Returns the last point, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Point> {
        self.0.last()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the contour and returns the underlying vector of points.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Total pixel count (`width * height`).
    #[must_use]
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An axis-aligned rectangle in image pixel space.
///
/// Defines both the sampling window for contour tracing and the clamp
/// boundary for expanded hull polygons. Every traced or expanded
/// coordinate is relative to this rectangle's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// Left edge in image pixels.
    pub left: u32,
    /// Top edge in image pixels.
    pub top: u32,
    /// Width in pixels. Must be non-zero.
    pub width: u32,
    /// Height in pixels. Must be non-zero.
    pub height: u32,
}

impl Region {
    /// Create a new region.
    #[must_use]
    pub const fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A region covering the whole image.
    #[must_use]
    pub const fn full(dimensions: Dimensions) -> Self {
        Self::new(0, 0, dimensions.width, dimensions.height)
    }

    /// Total pixel count (`width * height`).
    #[must_use]
    pub fn pixel_count(self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Area in square pixels, as a float for coverage ratios.
    #[must_use]
    pub fn area(self) -> f64 {
        f64::from(self.width) * f64::from(self.height)
    }

    /// Check the region against the image it will sample.
    ///
    /// # Errors
    ///
    /// Returns [`HullError::InvalidRegion`] if the region has a zero
    /// dimension or extends past the image bounds.
    pub fn validate(self, dimensions: Dimensions) -> Result<(), HullError> {
        let right = u64::from(self.left) + u64::from(self.width);
        let bottom = u64::from(self.top) + u64::from(self.height);
        if self.width == 0
            || self.height == 0
            || right > u64::from(dimensions.width)
            || bottom > u64::from(dimensions.height)
        {
            return Err(HullError::InvalidRegion {
                region: self,
                dimensions,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{}+{}+{}",
            self.width, self.height, self.left, self.top
        )
    }
}

/// Configuration for hull extraction.
///
/// # Invariants
///
/// `epsilon` must be finite and non-negative. It doubles as the
/// simplification tolerance and the outward expansion margin, both in
/// pixels. Use [`validate`](Self::validate) before running the
/// pipeline; the pipeline entry points call it themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HullConfig {
    /// Alpha threshold. A pixel is part of a shape when its alpha is
    /// strictly greater than this value (0-255 scale).
    pub threshold: u8,

    /// Simplification tolerance and expansion margin in pixels.
    pub epsilon: f64,

    /// Which triangulation strategy to use.
    pub triangulator: TriangulatorKind,

    /// What to do with hull polygons nested inside other hull polygons.
    pub nested_policy: NestedPolicy,
}

impl HullConfig {
    /// Default alpha threshold: any non-transparent pixel counts.
    pub const DEFAULT_THRESHOLD: u8 = 0;
    /// Default simplification tolerance / expansion margin in pixels.
    pub const DEFAULT_EPSILON: f64 = 2.0;

    /// Reject configurations the pipeline cannot honour.
    ///
    /// # Errors
    ///
    /// Returns [`HullError::InvalidConfig`] if `epsilon` is negative,
    /// NaN, or infinite.
    pub fn validate(&self) -> Result<(), HullError> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(HullError::InvalidConfig(format!(
                "epsilon must be finite and non-negative, got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

impl Default for HullConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            epsilon: Self::DEFAULT_EPSILON,
            triangulator: TriangulatorKind::default(),
            nested_policy: NestedPolicy::default(),
        }
    }
}

/// Errors that can occur during hull extraction.
///
/// "No shape" is never an error: fully transparent regions produce an
/// empty [`HullMesh`](crate::HullMesh). The tracing variants signal
/// broken internal invariants and abort the whole region.
#[derive(Debug, thiserror::Error)]
pub enum HullError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Hull configuration is invalid.
    #[error("invalid hull configuration: {0}")]
    InvalidConfig(String),

    /// The region is empty or does not fit inside the image.
    #[error("region {region} does not fit inside a {dimensions} image")]
    InvalidRegion {
        /// The offending region.
        region: Region,
        /// Dimensions of the sampled image.
        dimensions: Dimensions,
    },

    /// The tracer reached a cell with no boundary through it.
    #[error(
        "contour tracer hit square value {value} at ({x}, {y}) in region {region} with threshold {threshold}"
    )]
    InvalidSquare {
        /// The 2x2 neighbourhood bitmask (0 or 15).
        value: u8,
        /// Cursor x in image pixels.
        x: i64,
        /// Cursor y in image pixels.
        y: i64,
        /// Region being traced.
        region: Region,
        /// Alpha threshold in use.
        threshold: u8,
    },

    /// The tracer took more steps than the image has pixels.
    #[error(
        "contour tracer exceeded {limit} steps without closing in region {region} with threshold {threshold}"
    )]
    TraceRunaway {
        /// Step limit (the image pixel count).
        limit: u64,
        /// Region being traced.
        region: Region,
        /// Alpha threshold in use.
        threshold: u8,
    },

    /// Erasing traced contours stopped making progress.
    #[error(
        "contour erasure made no progress in region {region} with threshold {threshold}"
    )]
    ErasureStalled {
        /// Region being traced.
        region: Region,
        /// Alpha threshold in use.
        threshold: u8,
    },
}
