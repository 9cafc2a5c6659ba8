//! spritehull-bench: CLI tool for hull parameter experimentation and diagnostics.
//!
//! Runs the hull extraction pipeline on a given sprite image with
//! configurable parameters, printing per-stage diagnostics. Useful for:
//!
//! - Comparing triangulation strategies (`cdt` vs `earcut`)
//! - Tuning the alpha threshold and epsilon
//! - Measuring per-stage durations to identify bottlenecks
//! - Seeing how parameter changes affect loop, point, and triangle counts
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin spritehull-bench -- [OPTIONS] <IMAGE_PATH>
//! ```
//!
//! Set `RUST_LOG=debug` to see per-loop tracing output on stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use spritehull_pipeline::diagnostics::{Clock, HullDiagnostics};
use spritehull_pipeline::{HullConfig, HullMesh, NestedPolicy, Region, TriangulatorKind};

/// Hull parameter experimentation and diagnostics for spritehull.
///
/// Extracts the hull mesh of a sprite image with configurable parameters
/// and prints per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "spritehull-bench", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Alpha threshold: pixels with alpha above this value are opaque.
    #[arg(long, default_value_t = HullConfig::DEFAULT_THRESHOLD)]
    threshold: u8,

    /// Simplification tolerance and expansion margin in pixels.
    #[arg(long, default_value_t = HullConfig::DEFAULT_EPSILON)]
    epsilon: f64,

    /// Sampling region as `left,top,width,height`. Defaults to the
    /// whole image.
    #[arg(long, value_parser = parse_region)]
    region: Option<Region>,

    /// Triangulation strategy.
    #[arg(long, value_enum, default_value_t = Triangulator::Cdt)]
    triangulator: Triangulator,

    /// Handling of hull polygons nested inside other hull polygons.
    #[arg(long, value_enum, default_value_t = Nested::Keep)]
    nested: Nested,

    /// Write an SVG preview of the mesh to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write the mesh as JSON to file.
    #[arg(long)]
    mesh_json: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Full hull config as a JSON string.
    ///
    /// When provided, all other hull parameter flags are ignored.
    /// The JSON must be a valid `HullConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Triangulation strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Triangulator {
    /// Constrained Delaunay triangulation.
    Cdt,
    /// Ear clipping.
    Earcut,
}

/// Nested polygon policy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Nested {
    /// Keep every polygon.
    Keep,
    /// Drop polygons lying entirely inside another polygon.
    Absorb,
}

/// Parse `left,top,width,height` into a [`Region`].
fn parse_region(s: &str) -> Result<Region, String> {
    let parts: Vec<u32> = s
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .map_err(|e| format!("invalid region component {part:?}: {e}"))
        })
        .collect::<Result<_, _>>()?;
    match parts[..] {
        [left, top, width, height] => Ok(Region::new(left, top, width, height)),
        _ => Err(format!(
            "expected left,top,width,height but got {} components",
            parts.len()
        )),
    }
}

/// Build a [`HullConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<HullConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(HullConfig {
        threshold: cli.threshold,
        epsilon: cli.epsilon,
        triangulator: match cli.triangulator {
            Triangulator::Cdt => TriangulatorKind::ConstrainedDelaunay,
            Triangulator::Earcut => TriangulatorKind::Earcut,
        },
        nested_policy: match cli.nested {
            Nested::Keep => NestedPolicy::Keep,
            Nested::Absorb => NestedPolicy::Absorb,
        },
    })
}

fn main() -> ExitCode {
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let image_bytes = match std::fs::read(&cli.image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };

    let image = match spritehull_pipeline::decode::decode_rgba(&image_bytes) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("Error decoding {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };
    let region = cli
        .region
        .unwrap_or_else(|| Region::new(0, 0, image.width(), image.height()));

    eprintln!(
        "Image: {} ({} bytes, {}x{})",
        cli.image_path.display(),
        image_bytes.len(),
        image.width(),
        image.height(),
    );
    eprintln!("Region: {region}");
    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        match spritehull_pipeline::diagnostics::generate_with_diagnostics(
            &image, region, &config, &StdClock,
        ) {
            Ok((mesh, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write outputs on the first run only.
                if run == 0 {
                    let written = cli
                        .svg
                        .as_deref()
                        .map_or(Ok(()), |path| {
                            write_svg(path, &cli.image_path, &mesh, region, &config)
                        })
                        .and_then(|()| {
                            cli.mesh_json
                                .as_deref()
                                .map_or(Ok(()), |path| write_mesh_json(path, &mesh))
                        });
                    if let Err(msg) = written {
                        eprintln!("{msg}");
                        return ExitCode::FAILURE;
                    }
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// Write an SVG preview of `mesh` to `path`.
fn write_svg(
    path: &Path,
    image_path: &Path,
    mesh: &HullMesh,
    region: Region,
    config: &HullConfig,
) -> Result<(), String> {
    let title = image_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("bench");
    let desc = format!(
        "threshold={} epsilon={} region={region}",
        config.threshold, config.epsilon
    );
    let config_json = serde_json::to_string(config).ok();
    let metadata = spritehull_export::SvgMetadata {
        title: Some(title),
        description: Some(&desc),
        config_json: config_json.as_deref(),
    };
    let svg = spritehull_export::to_svg(mesh, region, &metadata);
    std::fs::write(path, &svg)
        .map_err(|e| format!("Error writing SVG to {}: {e}", path.display()))?;
    eprintln!("SVG written to {} ({} bytes)", path.display(), svg.len());
    Ok(())
}

/// Write `mesh` as pretty-printed JSON to `path`.
fn write_mesh_json(path: &Path, mesh: &HullMesh) -> Result<(), String> {
    let json =
        serde_json::to_string_pretty(mesh).map_err(|e| format!("Error serializing mesh: {e}"))?;
    std::fs::write(path, &json)
        .map_err(|e| format!("Error writing mesh to {}: {e}", path.display()))?;
    eprintln!("Mesh written to {} ({} bytes)", path.display(), json.len());
    Ok(())
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&HullDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[HullDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Discovery", |d| d.discovery.duration),
        ("Extraction", |d| d.extraction.duration),
        ("Triangulation", |d| d.triangulation.duration),
        ("UV Mapping", |d| d.uv_mapping.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}
