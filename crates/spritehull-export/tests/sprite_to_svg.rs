//! Integration test: run a synthetic sprite through the full pipeline and export to SVG.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use spritehull_pipeline::{HullConfig, Region, RgbaImage};

/// A 48x40 sprite holding a disc and a separate bar, on a transparent
/// background with a soft alpha ramp around the disc.
fn synthetic_sprite() -> RgbaImage {
    RgbaImage::from_fn(48, 40, |x, y| {
        let (dx, dy) = (f64::from(x) - 16.5, f64::from(y) - 18.5);
        let r = dx.hypot(dy);
        let alpha = if r < 11.0 {
            255
        } else if r < 13.0 {
            96
        } else if (34..44).contains(&x) && (6..34).contains(&y) {
            255
        } else {
            0
        };
        image::Rgba([200, 120, 40, alpha])
    })
}

#[test]
fn synthetic_sprite_pipeline_to_svg() {
    let image = synthetic_sprite();
    let region = Region::new(0, 0, image.width(), image.height());
    let config = HullConfig::default();

    let mesh = spritehull_pipeline::generate_mesh(&image, region, &config)
        .expect("pipeline should succeed");
    eprintln!(
        "Pipeline produced {} triangles over {} vertices",
        mesh.triangle_count(),
        mesh.vertices.len(),
    );
    assert!(!mesh.is_empty(), "expected a non-empty mesh");
    assert!(mesh.indices_valid());

    let summary = config_summary(&config);
    let svg = spritehull_export::to_svg(
        &mesh,
        region,
        &spritehull_export::SvgMetadata {
            title: Some("synthetic"),
            description: Some("disc and bar"),
            config_json: Some(&summary),
        },
    );

    assert!(svg.starts_with("<?xml"));
    assert!(svg.contains("<svg"));
    assert!(svg.contains("</svg>"));
    assert!(svg.contains("<title>synthetic</title>"));
    assert_eq!(svg.matches("<path").count(), mesh.triangle_count());
    assert_eq!(svg.matches("<circle").count(), mesh.debug_points.len());
}

/// One-line config summary for the metadata block.
fn config_summary(config: &HullConfig) -> String {
    format!(
        "threshold={} epsilon={} triangulator={:?} nested={:?}",
        config.threshold, config.epsilon, config.triangulator, config.nested_policy
    )
}
