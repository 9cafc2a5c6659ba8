//! SVG preview serializer.
//!
//! Renders a [`HullMesh`] as an SVG document sized to the region it was
//! extracted from, using the [`svg`] crate for document construction,
//! XML escaping, and path data formatting.
//!
//! Each triangle becomes a closed `<path>` (`M`, `L`, `L`, `Z`) under
//! `<g id="triangles">`. The hull polygon points the pipeline keeps for
//! debugging are drawn as small `<circle>` markers under
//! `<g id="hull-points">`, so the SVG shows the hull outline on top of
//! the triangulation that fills it.
//!
//! Optional [`SvgMetadata`] embeds `<title>` and `<desc>` elements, plus
//! a `<metadata>` block carrying the serialized hull configuration.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Circle, Description, Element, Group, Path, Title};
use svg::node::{Node, Text, Value};

use spritehull_pipeline::{HullMesh, Point, Region};

/// Radius of the hull point markers, in region pixels.
const POINT_RADIUS: f64 = 0.35;

/// Metadata to embed in the SVG document.
///
/// Every field is optional. Text values are XML-escaped automatically
/// by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Serialized [`HullConfig`](spritehull_pipeline::HullConfig) JSON,
    /// emitted inside `<metadata>` wrapped in a namespaced
    /// `<spritehull:config>` element.
    pub config_json: Option<&'a str>,
}

/// Build an SVG path `d` attribute string for a closed outline.
///
/// Uses `M` for the first point, `L` for the rest, and `Z` to close.
/// Returns an empty string for fewer than 3 points, which enclose
/// nothing.
///
/// # Examples
///
/// ```
/// use spritehull_pipeline::Point;
/// use spritehull_export::build_path_data;
///
/// let d = build_path_data(&[
///     Point::new(0.0, 0.0),
///     Point::new(4.0, 0.0),
///     Point::new(0.0, 3.0),
/// ]);
/// assert_eq!(d, "M0,0 L4,0 L0,3 z");
/// ```
#[must_use]
pub fn build_path_data(points: &[Point]) -> String {
    let [first, rest @ ..] = points else {
        return String::new();
    };
    if rest.len() < 2 {
        return String::new();
    }

    let mut data = Data::new().move_to((first.x, first.y));
    for p in rest {
        data = data.line_to((p.x, p.y));
    }
    String::from(Value::from(data.close()))
}

/// Serialize a hull mesh into an SVG preview document.
///
/// The document's `width`, `height`, and `viewBox` match `region`, so
/// vertex positions (which are region-relative) land on the pixels they
/// were traced from. Triangles with an out-of-range index are skipped.
#[must_use]
pub fn to_svg(mesh: &HullMesh, region: Region, metadata: &SvgMetadata<'_>) -> String {
    let mut doc = Document::new()
        .set("width", region.width)
        .set("height", region.height)
        .set("viewBox", (0, 0, region.width, region.height));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }

    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }

    if let Some(config_json) = metadata.config_json {
        let mut config_el = Element::new("spritehull:config");
        config_el.assign("xmlns:spritehull", "https://github.com/spritehull/spritehull/ns/1");
        config_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(config_el);
        doc = doc.add(metadata_el);
    }

    let mut triangles = Group::new()
        .set("id", "triangles")
        .set("fill", "none")
        .set("stroke", "black")
        .set("stroke-width", 0.1)
        .set("stroke-linejoin", "round");
    for corners in mesh.triangles() {
        let d = build_path_data(&corners);
        if d.is_empty() {
            continue;
        }
        triangles = triangles.add(Path::new().set("d", d));
    }
    doc = doc.add(triangles);

    if !mesh.debug_points.is_empty() {
        let mut points = Group::new().set("id", "hull-points").set("fill", "red");
        for p in &mesh.debug_points {
            points = points.add(
                Circle::new()
                    .set("cx", p.x)
                    .set("cy", p.y)
                    .set("r", POINT_RADIUS),
            );
        }
        doc = doc.add(points);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use spritehull_pipeline::Vertex;

    fn square_mesh() -> HullMesh {
        let corners = [
            Point::new(1.0, 1.0),
            Point::new(9.0, 1.0),
            Point::new(9.0, 9.0),
            Point::new(1.0, 9.0),
        ];
        HullMesh {
            vertices: corners.iter().copied().map(Vertex::at).collect(),
            indices: vec![0, 1, 2, 0, 2, 3],
            debug_points: corners.to_vec(),
        }
    }

    #[test]
    fn path_data_needs_three_points() {
        assert_eq!(build_path_data(&[]), "");
        assert_eq!(
            build_path_data(&[Point::new(0.0, 0.0), Point::new(1.0, 1.0)]),
            ""
        );
    }

    #[test]
    fn path_data_is_closed() {
        let d = build_path_data(&[
            Point::new(1.5, 2.0),
            Point::new(3.0, 2.0),
            Point::new(3.0, 4.25),
        ]);
        assert_eq!(d, "M1.5,2 L3,2 L3,4.25 z");
    }

    #[test]
    fn document_is_sized_to_region() {
        let svg = to_svg(
            &HullMesh::default(),
            Region::new(5, 7, 32, 24),
            &SvgMetadata::default(),
        );
        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("width=\"32\""));
        assert!(svg.contains("height=\"24\""));
        assert!(svg.contains("viewBox=\"0 0 32 24\""));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn one_path_per_triangle() {
        let svg = to_svg(&square_mesh(), Region::new(0, 0, 10, 10), &SvgMetadata::default());
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains("M1,1 L9,1 L9,9 z"));
        assert!(svg.contains("M1,1 L9,9 L1,9 z"));
    }

    #[test]
    fn hull_points_drawn_as_markers() {
        let svg = to_svg(&square_mesh(), Region::new(0, 0, 10, 10), &SvgMetadata::default());
        assert!(svg.contains("id=\"hull-points\""));
        assert_eq!(svg.matches("<circle").count(), 4);
    }

    #[test]
    fn empty_mesh_has_no_markers_or_paths() {
        let svg = to_svg(
            &HullMesh::default(),
            Region::new(0, 0, 4, 4),
            &SvgMetadata::default(),
        );
        assert!(!svg.contains("<path"));
        assert!(!svg.contains("hull-points"));
    }

    #[test]
    fn metadata_is_escaped() {
        let metadata = SvgMetadata {
            title: Some("hero <idle>"),
            description: Some("epsilon=2 & threshold=0"),
            config_json: Some("{\"epsilon\":2.0}"),
        };
        let svg = to_svg(&square_mesh(), Region::new(0, 0, 10, 10), &metadata);
        assert!(svg.contains("<title>hero &lt;idle&gt;</title>"));
        assert!(svg.contains("epsilon=2 &amp; threshold=0"));
        assert!(svg.contains("<spritehull:config"));
        assert!(svg.contains("xmlns:spritehull="));
    }

    #[test]
    fn out_of_range_triangles_are_skipped() {
        let mut mesh = square_mesh();
        mesh.indices.extend([0, 1, 99]);
        let svg = to_svg(&mesh, Region::new(0, 0, 10, 10), &SvgMetadata::default());
        assert_eq!(svg.matches("<path").count(), 2);
    }
}
