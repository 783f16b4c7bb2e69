//! arealens: detect shapes in an image and report their measurements.
//!
//! Runs the detection pipeline on an image file, measures every shape at
//! the given scale and prints a table (or a JSON report) to stdout.
//! Progress, diagnostics and file-write notices go to stderr.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin arealens -- [OPTIONS] <IMAGE_PATH>
//! ```
//!
//! # Examples
//!
//! ```text
//! # Calibrate from two points 50 mm apart, write an annotated PNG.
//! arealens photo.jpg --calibrate 120,40,620,40,50 --png annotated.png
//!
//! # 12.5 px per inch, machine-readable output with a cost estimate.
//! arealens photo.jpg --scale 12.5 --unit in --json \
//!     --cost-json '{"area_cost": 0.4, "setup_cost": 15}'
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};

use arealens_export::{AnalysisReport, OverlayStyle, SvgMetadata};
use arealens_measure::{CostFormula, Unit};
use arealens_pipeline::diagnostics::Clock;
use arealens_pipeline::{ContourTracerKind, DetectionConfig, Point};

/// Detect geometric shapes in a photo and measure their real-world area
/// and perimeter.
#[derive(Parser)]
#[command(name = "arealens", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Pixels per real-world unit. Zero or negative reports pixel values.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    scale: f64,

    /// Derive the scale from two image points a known distance apart.
    #[arg(long, value_name = "X1,Y1,X2,Y2,LENGTH", conflicts_with = "scale")]
    calibrate: Option<Calibration>,

    /// Real-world unit the scale refers to (mm, cm, m, in, ft).
    #[arg(long, default_value = "mm")]
    unit: Unit,

    /// Gradient threshold for edge pixels (0-255).
    #[arg(long, default_value_t = DetectionConfig::DEFAULT_EDGE_THRESHOLD)]
    threshold: u8,

    /// Minimum traced pixels for a contour to count.
    #[arg(long, default_value_t = DetectionConfig::DEFAULT_MIN_CONTOUR_POINTS, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    min_points: usize,

    /// Douglas-Peucker simplification tolerance in pixels.
    #[arg(long, default_value_t = DetectionConfig::DEFAULT_SIMPLIFY_TOLERANCE)]
    tolerance: f64,

    /// Contour tracing algorithm.
    #[arg(long, value_enum, default_value_t = Tracer::FloodFill)]
    tracer: Tracer,

    /// Full detection config as a JSON string.
    ///
    /// When provided, the individual detection flags are ignored. The JSON
    /// must be a valid `DetectionConfig` serialization; missing fields take
    /// their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Print the analysis report as JSON instead of a table.
    #[arg(long)]
    json: bool,

    /// Print per-stage timing and counts to stderr.
    #[arg(long)]
    diagnostics: bool,

    /// Write an SVG of the detected shapes to this path.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write the image with shape outlines drawn over it to this path.
    #[arg(long)]
    png: Option<PathBuf>,

    /// Estimate cost with a `CostFormula` given as a JSON string.
    #[arg(long)]
    cost_json: Option<String>,
}

/// Contour tracing algorithm selection.
#[derive(Clone, Copy, ValueEnum)]
enum Tracer {
    /// 8-connected flood fill in raster order.
    FloodFill,
    /// Suzuki-Abe border following.
    BorderFollowing,
}

/// Two points and the real distance between them.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Calibration {
    from: Point,
    to: Point,
    length: f64,
}

impl FromStr for Calibration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("expected numbers: {e}"))?;
        match values[..] {
            [x1, y1, x2, y2, length] => Ok(Self {
                from: Point::new(x1, y1),
                to: Point::new(x2, y2),
                length,
            }),
            _ => Err(format!("expected 5 values, got {}", values.len())),
        }
    }
}

/// Build a [`DetectionConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual detection flags are ignored.
fn config_from_cli(cli: &Cli) -> Result<DetectionConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(DetectionConfig {
        edge_threshold: cli.threshold,
        min_contour_points: cli.min_points,
        simplify_tolerance: cli.tolerance,
        contour_tracer: match cli.tracer {
            Tracer::FloodFill => ContourTracerKind::FloodFill,
            Tracer::BorderFollowing => ContourTracerKind::BorderFollowing,
        },
    })
}

/// Resolve the scale: calibration wins over `--scale`.
fn scale_from_cli(cli: &Cli) -> Result<f64, String> {
    cli.calibrate.map_or(Ok(cli.scale), |c| {
        arealens_measure::calibrate(c.from, c.to, c.length)
            .map_err(|e| format!("Error in --calibrate: {e}"))
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let scale = match scale_from_cli(&cli) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let cost_formula = match cli.cost_json.as_deref().map(serde_json::from_str::<CostFormula>) {
        None => None,
        Some(Ok(formula)) => Some(formula),
        Some(Err(e)) => {
            eprintln!("Error parsing --cost-json: {e}");
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

    eprintln!(
        "Image: {} ({} bytes)",
        cli.image_path.display(),
        image_bytes.len(),
    );
    eprintln!("Config: {config:#?}");
    if arealens_measure::is_calibrated(scale) {
        eprintln!("Scale: {scale:.4} px/{}", cli.unit);
    } else {
        eprintln!("Scale: not calibrated, reporting pixels");
    }
    eprintln!();

    let image = match arealens_pipeline::decode(&image_bytes) {
        Ok(img) => img,
        Err(e) => {
            eprintln!("Pipeline error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (staged, diagnostics) =
        match arealens_pipeline::diagnostics::detect_with_diagnostics(&image, &config, &StdClock) {
            Ok(result) => result,
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        };

    if cli.diagnostics {
        eprintln!("{}", diagnostics.report());
    }

    let report = AnalysisReport::from_records(&staged.shapes, staged.dimensions, scale);

    if cli.json {
        match report.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_table(&report, cli.unit);
    }

    if let Some(mut formula) = cost_formula {
        // Measure at the command-line scale unless the formula pins its own.
        formula.scale.get_or_insert(scale);
        let shapes: Vec<_> = staged.shapes.iter().map(|r| r.shape.clone()).collect();
        match arealens_measure::complex_cost(&shapes, &formula) {
            Ok(cost) => {
                let line = format!("Estimated cost: {}", arealens_measure::format_cost(cost, "$", 2));
                if cli.json {
                    eprintln!("{line}");
                } else {
                    println!("{line}");
                }
            }
            Err(e) => {
                eprintln!("Error in --cost-json: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    if let Some(ref svg_path) = cli.svg {
        let title = cli
            .image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("arealens");
        let desc = format!("scale={scale} px/{}, {config:?}", cli.unit);
        let metadata = SvgMetadata {
            title: Some(title),
            description: Some(&desc),
        };
        let svg = arealens_export::to_svg(&staged.shapes, staged.dimensions, &metadata);
        match std::fs::write(svg_path, &svg) {
            Ok(()) => {
                eprintln!(
                    "SVG written to {} ({} bytes)",
                    svg_path.display(),
                    svg.len(),
                );
            }
            Err(e) => {
                eprintln!("Error writing SVG to {}: {e}", svg_path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    if let Some(ref png_path) = cli.png {
        let overlay =
            arealens_export::render_overlay(&staged.original, &staged.shapes, &OverlayStyle::default());
        match overlay.save_with_format(png_path, image::ImageFormat::Png) {
            Ok(()) => eprintln!("Overlay written to {}", png_path.display()),
            Err(e) => {
                eprintln!("Error writing overlay to {}: {e}", png_path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

/// Print one row per shape plus totals.
fn print_table(report: &AnalysisReport, unit: Unit) {
    let unit = report.image.calibrated.then_some(unit);

    println!(
        "{}x{} image, {} shape(s)",
        report.image.width,
        report.image.height,
        report.shapes.len(),
    );
    if report.shapes.is_empty() {
        return;
    }

    println!();
    println!("{:>4}  {:<10} {:>18} {:>16}", "#", "Kind", "Area", "Perimeter");
    println!("{}", "-".repeat(52));
    for shape in &report.shapes {
        println!(
            "{:>4}  {:<10} {:>18} {:>16}",
            shape.index,
            shape.kind,
            arealens_measure::format_area(shape.area, unit, 2),
            arealens_measure::format_perimeter(shape.perimeter, unit, 2),
        );
    }
    println!("{}", "-".repeat(52));
    println!(
        "{:>4}  {:<10} {:>18} {:>16}",
        "",
        "Total",
        arealens_measure::format_area(report.total_area, unit, 2),
        arealens_measure::format_perimeter(report.total_perimeter, unit, 2),
    );
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
