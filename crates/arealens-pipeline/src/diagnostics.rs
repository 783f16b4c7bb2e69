//! Pipeline diagnostics: timing, counts, and other metrics for each stage.
//!
//! These diagnostics are permanent instrumentation for tuning thresholds
//! and tolerances against real images. [`detect_with_diagnostics`] runs the
//! full staged pipeline and records one [`StageDiagnostics`] per stage.
//!
//! Timing goes through the [`Clock`] trait so callers pick the time
//! source. [`WebClock`] uses the `web-time` crate, which maps to
//! `performance.now()` on WASM and `std::time::Instant` on native.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::{Pipeline, PipelineStage};
use crate::types::{Contour, DetectionConfig, PipelineError, RgbaImage, StagedResult};

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
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// A monotonic time source.
pub trait Clock {
    /// Opaque point in time.
    type Instant;

    /// The current instant.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// [`Clock`] backed by `web_time::Instant`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebClock;

impl Clock for WebClock {
    type Instant = web_time::Instant;

    fn now(&self) -> web_time::Instant {
        web_time::Instant::now()
    }

    fn elapsed(&self, since: &web_time::Instant) -> Duration {
        since.elapsed()
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stage 1: grayscale conversion.
    pub grayscale: StageDiagnostics,
    /// Stage 2: Gaussian blur.
    pub blur: StageDiagnostics,
    /// Stage 3: Sobel gradient.
    pub gradient: StageDiagnostics,
    /// Stage 4: edge thresholding.
    pub threshold: StageDiagnostics,
    /// Stage 5: contour tracing.
    pub contour_tracing: StageDiagnostics,
    /// Stage 6: Douglas-Peucker simplification.
    pub simplification: StageDiagnostics,
    /// Stage 7: shape classification.
    pub classification: StageDiagnostics,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: PipelineSummary,
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
    /// Source bitmap metrics.
    Source {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Total pixel count (`width * height`).
        pixel_count: u64,
    },
    /// Grayscale conversion metrics.
    Grayscale {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
    /// Gaussian blur metrics.
    Blur {
        /// Mean value of the smoothed buffer.
        mean_intensity: f64,
    },
    /// Sobel gradient metrics.
    Gradient {
        /// Largest magnitude in the image.
        max_magnitude: u8,
        /// Mean magnitude.
        mean_magnitude: f64,
    },
    /// Thresholding metrics.
    Threshold {
        /// Threshold the gradient was compared against.
        threshold: u8,
        /// Number of edge pixels (value == 255) in the output.
        edge_pixel_count: u64,
        /// Total pixel count for computing edge density.
        total_pixel_count: u64,
    },
    /// Contour tracing metrics.
    ContourTracing {
        /// Which tracer ran.
        tracer: String,
        /// Number of contours kept.
        contour_count: usize,
        /// Total number of points across all contours.
        total_point_count: usize,
        /// Minimum points in any single contour.
        min_contour_points: usize,
        /// Maximum points in any single contour.
        max_contour_points: usize,
        /// Mean points per contour.
        mean_contour_points: f64,
    },
    /// Simplification metrics.
    Simplification {
        /// Douglas-Peucker tolerance in pixels.
        tolerance: f64,
        /// Number of contours simplified.
        contour_count: usize,
        /// Total points before simplification.
        points_before: usize,
        /// Total points after simplification.
        points_after: usize,
        /// Reduction ratio: `1.0 - (after / before)`.
        reduction_ratio: f64,
    },
    /// Classification metrics.
    Classification {
        /// Number of shape records produced.
        shape_count: usize,
        /// Simplified contours with too few points to classify.
        dropped_count: usize,
        /// Rectangles found.
        rectangles: usize,
        /// Circles found.
        circles: usize,
        /// Triangles found.
        triangles: usize,
        /// Polygons found.
        polygons: usize,
    },
}

/// High-level summary counts for the entire pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Source image width in pixels.
    pub image_width: u32,
    /// Source image height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Number of contours above the noise floor.
    pub contour_count: usize,
    /// Number of shape records produced.
    pub shape_count: usize,
}

impl PipelineDiagnostics {
    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Image: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
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
        let stages = [
            ("Grayscale", &self.grayscale),
            ("Blur", &self.blur),
            ("Gradient", &self.gradient),
            ("Threshold", &self.threshold),
            ("Contour Tracing", &self.contour_tracing),
            ("Simplification", &self.simplification),
            ("Classification", &self.classification),
        ];

        for (name, diag) in stages {
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
            "Contours: {}  |  Shapes: {}",
            self.summary.contour_count, self.summary.shape_count,
        ));

        lines.join("\n")
    }
}

/// Run the full pipeline on `image`, timing every stage.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `config` is invalid.
pub fn detect_with_diagnostics<C: Clock>(
    image: &RgbaImage,
    config: &DetectionConfig,
    clock: &C,
) -> Result<(StagedResult, PipelineDiagnostics), PipelineError> {
    let start = clock.now();
    let pending = Pipeline::new(image.clone(), config.clone())?;

    let t = clock.now();
    let stage = pending.grayscale();
    let grayscale = record(clock, &t, &stage);

    let t = clock.now();
    let stage = stage.blur();
    let blur = record(clock, &t, &stage);

    let t = clock.now();
    let stage = stage.gradient();
    let gradient = record(clock, &t, &stage);

    let t = clock.now();
    let stage = stage.threshold();
    let threshold = record(clock, &t, &stage);

    let t = clock.now();
    let stage = stage.trace_contours();
    let contour_tracing = record(clock, &t, &stage);

    let t = clock.now();
    let stage = stage.simplify();
    let simplification = record(clock, &t, &stage);

    let t = clock.now();
    let stage = stage.classify();
    let classification = record(clock, &t, &stage);

    let staged = stage.into_result();
    let total_duration = clock.elapsed(&start);

    let summary = PipelineSummary {
        image_width: staged.dimensions.width,
        image_height: staged.dimensions.height,
        pixel_count: staged.dimensions.pixel_count(),
        contour_count: staged.contours.len(),
        shape_count: staged.shapes.len(),
    };

    Ok((
        staged,
        PipelineDiagnostics {
            grayscale,
            blur,
            gradient,
            threshold,
            contour_tracing,
            simplification,
            classification,
            total_duration,
            summary,
        },
    ))
}

/// Close a stage timer and capture the stage's metrics.
///
/// Metrics are computed after the timer stops so they don't inflate the
/// stage duration.
fn record<C: Clock, S: PipelineStage>(
    clock: &C,
    started: &C::Instant,
    stage: &S,
) -> StageDiagnostics {
    let duration = clock.elapsed(started);
    StageDiagnostics {
        duration,
        metrics: stage.metrics(),
    }
}

/// Convert a `Duration` to milliseconds as `f64`.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Format stage metrics into a compact detail string.
fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Source {
            width,
            height,
            pixel_count,
        } => format!("{width}x{height} ({pixel_count} px)"),
        StageMetrics::Grayscale { width, height } => format!("{width}x{height}"),
        StageMetrics::Blur { mean_intensity } => format!("mean={mean_intensity:.1}"),
        StageMetrics::Gradient {
            max_magnitude,
            mean_magnitude,
        } => format!("max={max_magnitude} mean={mean_magnitude:.1}"),
        StageMetrics::Threshold {
            threshold,
            edge_pixel_count,
            total_pixel_count,
        } => {
            #[allow(clippy::cast_precision_loss)]
            let density = if *total_pixel_count > 0 {
                *edge_pixel_count as f64 / *total_pixel_count as f64 * 100.0
            } else {
                0.0
            };
            format!(">{threshold} edges={edge_pixel_count} ({density:.1}%)")
        }
        StageMetrics::ContourTracing {
            tracer,
            contour_count,
            total_point_count,
            min_contour_points,
            max_contour_points,
            mean_contour_points,
        } => {
            format!(
                "{tracer} {contour_count} contours, {total_point_count} pts (min={min_contour_points} max={max_contour_points} mean={mean_contour_points:.1})",
            )
        }
        StageMetrics::Simplification {
            tolerance,
            points_before,
            points_after,
            reduction_ratio,
            ..
        } => {
            format!(
                "tol={tolerance:.2} {points_before}->{points_after} pts ({:.1}% reduction)",
                reduction_ratio * 100.0,
            )
        }
        StageMetrics::Classification {
            shape_count,
            dropped_count,
            rectangles,
            circles,
            triangles,
            polygons,
        } => {
            format!(
                "{shape_count} shapes (rect={rectangles} circle={circles} tri={triangles} poly={polygons}), {dropped_count} dropped",
            )
        }
    }
}

/// Count edge pixels (value == 255) in a grayscale image.
pub(crate) fn count_edge_pixels(image: &image::GrayImage) -> u64 {
    image
        .pixels()
        .map(|p| u64::from(u8::from(p.0[0] == 255)))
        .sum()
}

/// Mean pixel value, 0 for an empty image.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean_intensity(image: &image::GrayImage) -> f64 {
    let count = image.as_raw().len();
    if count == 0 {
        return 0.0;
    }
    let sum: u64 = image.as_raw().iter().map(|&v| u64::from(v)).sum();
    sum as f64 / count as f64
}

/// Statistics for a set of contours.
pub(crate) struct ContourStats {
    /// Total number of points across all contours.
    pub total: usize,
    /// Minimum number of points in any single contour.
    pub min: usize,
    /// Maximum number of points in any single contour.
    pub max: usize,
    /// Mean number of points per contour.
    pub mean: f64,
}

/// Compute contour statistics.
pub(crate) fn contour_stats(contours: &[Contour]) -> ContourStats {
    let total = total_points(contours);
    let min = contours.iter().map(Contour::len).min().unwrap_or(0);
    let max = contours.iter().map(Contour::len).max().unwrap_or(0);
    #[allow(clippy::cast_precision_loss)]
    let mean = if contours.is_empty() {
        0.0
    } else {
        total as f64 / contours.len() as f64
    };
    ContourStats {
        total,
        min,
        max,
        mean,
    }
}

/// Total points across a slice of contours.
pub(crate) fn total_points(contours: &[Contour]) -> usize {
    contours.iter().map(Contour::len).sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::types::Point;

    /// Clock that advances one millisecond per reading.
    struct TickClock(Cell<u64>);

    impl Clock for TickClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn ring_bitmap() -> RgbaImage {
        let mut img = RgbaImage::from_pixel(40, 40, image::Rgba([0, 0, 0, 255]));
        for y in 10..30 {
            for x in 10..30 {
                img.put_pixel(x, y, image::Rgba([200, 200, 200, 255]));
            }
        }
        img
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let ms = duration_ms(Duration::from_millis(1234));
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn count_edge_pixels_works() {
        let mut img = image::GrayImage::new(10, 10);
        for i in 0..5 {
            img.put_pixel(i, 0, image::Luma([255]));
        }
        img.put_pixel(9, 9, image::Luma([254]));
        assert_eq!(count_edge_pixels(&img), 5);
    }

    #[test]
    fn mean_intensity_of_half_white() {
        let img = image::GrayImage::from_fn(4, 2, |_, y| image::Luma([if y == 0 { 200 } else { 0 }]));
        assert!((mean_intensity(&img) - 100.0).abs() < f64::EPSILON);
        assert!(mean_intensity(&image::GrayImage::new(0, 0)).abs() < f64::EPSILON);
    }

    #[test]
    fn contour_stats_empty() {
        let stats = contour_stats(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.min, 0);
        assert_eq!(stats.max, 0);
        assert!(stats.mean.abs() < f64::EPSILON);
    }

    #[test]
    fn contour_stats_computes() {
        let contours = vec![
            Contour::new(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]),
            Contour::new(vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(2.0, 0.0),
                Point::new(3.0, 0.0),
            ]),
        ];
        let stats = contour_stats(&contours);
        assert_eq!(stats.total, 6);
        assert_eq!(stats.min, 2);
        assert_eq!(stats.max, 4);
        assert!((stats.mean - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn diagnostics_cover_every_stage() {
        let clock = TickClock(Cell::new(0));
        let (staged, diag) =
            detect_with_diagnostics(&ring_bitmap(), &DetectionConfig::default(), &clock).unwrap();

        assert_eq!(diag.summary.image_width, 40);
        assert_eq!(diag.summary.pixel_count, 1600);
        assert_eq!(diag.summary.shape_count, staged.shapes.len());
        assert_eq!(diag.summary.contour_count, staged.contours.len());
        for stage in [
            &diag.grayscale,
            &diag.blur,
            &diag.gradient,
            &diag.threshold,
            &diag.contour_tracing,
            &diag.simplification,
            &diag.classification,
        ] {
            assert_eq!(stage.duration, Duration::from_millis(1));
        }
        assert!(diag.total_duration > Duration::from_millis(7));
        assert!(matches!(
            diag.threshold.metrics,
            StageMetrics::Threshold { threshold: 50, .. }
        ));
    }

    #[test]
    fn invalid_config_surfaces_error() {
        let config = DetectionConfig {
            min_contour_points: 0,
            ..DetectionConfig::default()
        };
        let result = detect_with_diagnostics(&ring_bitmap(), &config, &WebClock);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn report_lists_every_stage() {
        let (_, diag) =
            detect_with_diagnostics(&ring_bitmap(), &DetectionConfig::default(), &WebClock)
                .unwrap();
        let report = diag.report();
        for name in [
            "Grayscale",
            "Blur",
            "Gradient",
            "Threshold",
            "Contour Tracing",
            "Simplification",
            "Classification",
        ] {
            assert!(report.contains(name), "report missing {name}");
        }
        assert!(report.contains("Image: 40x40"));
    }

    #[test]
    fn diagnostics_serde_round_trip() {
        let (_, diag) =
            detect_with_diagnostics(&ring_bitmap(), &DetectionConfig::default(), &WebClock)
                .unwrap();
        let json = serde_json::to_string(&diag).unwrap();
        let back: PipelineDiagnostics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.summary.shape_count, diag.summary.shape_count);
        assert_eq!(back.classification.metrics, diag.classification.metrics);
    }
}
