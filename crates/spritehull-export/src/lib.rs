//! spritehull-export: Pure format serializers for spritehull meshes (sans-IO).
//!
//! Converts a [`HullMesh`](spritehull_pipeline::HullMesh) into an SVG
//! preview string. No file I/O: callers decide where the bytes go.

pub mod svg;

pub use svg::{SvgMetadata, build_path_data, to_svg};
