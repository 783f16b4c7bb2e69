//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::detect_shapes`] which runs the whole detector in one
//! call, [`Pipeline`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use arealens_pipeline::{DetectionConfig, Pipeline, PipelineError, RgbaImage};
//! # fn run(bitmap: RgbaImage) -> Result<(), PipelineError> {
//! let staged = Pipeline::new(bitmap, DetectionConfig::default())?
//!     .grayscale()
//!     .blur()
//!     .gradient()
//!     .threshold()
//!     .trace_contours()
//!     .simplify()
//!     .classify()
//!     .into_result();
//! # Ok(())
//! # }
//! ```
//!
//! Configuration is validated once, when the pipeline is created; every
//! stage transition after that is infallible.
//!
//! # Memory
//!
//! Every stage carries the full raster stack forward so the final
//! [`StagedResult`] can expose each intermediate for visualization. For a
//! 1000×1000 bitmap that is about 8 MB pinned until
//! [`Classified::into_result`]. Callers that only need the shape records
//! should use [`crate::detect_shapes`].

use crate::contour::ContourTracer;
use crate::diagnostics::{StageMetrics, contour_stats, count_edge_pixels, total_points};
use crate::types::{
    Contour, DetectionConfig, Dimensions, GrayImage, PipelineError, RgbaImage, ShapeKind,
    ShapeRecord, StagedResult,
};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// Call [`grayscale`](Self::grayscale) to advance.
#[must_use = "pipeline stages are consumed by advancing — call .grayscale() to continue"]
pub struct Pending {
    config: DetectionConfig,
    original: RgbaImage,
}

impl Pending {
    /// The source bitmap.
    #[must_use]
    pub const fn original(&self) -> &RgbaImage {
        &self.original
    }

    /// Convert to luminance and advance to [`Grayscaled`].
    pub fn grayscale(self) -> Grayscaled {
        let grayscale = crate::grayscale::to_grayscale(&self.original);
        Grayscaled {
            config: self.config,
            original: self.original,
            grayscale,
        }
    }
}

// ───────────────────────── Stage 1: Grayscaled ───────────────────────

/// Pipeline state after grayscale conversion.
#[must_use = "pipeline stages are consumed by advancing — call .blur() to continue"]
pub struct Grayscaled {
    config: DetectionConfig,
    original: RgbaImage,
    grayscale: GrayImage,
}

impl Grayscaled {
    /// The luminance buffer.
    #[must_use]
    pub const fn grayscale(&self) -> &GrayImage {
        &self.grayscale
    }

    /// Smooth with the 3x3 kernel and advance to [`Blurred`].
    pub fn blur(self) -> Blurred {
        let blurred = crate::blur::gaussian_blur(&self.grayscale);
        Blurred {
            config: self.config,
            original: self.original,
            grayscale: self.grayscale,
            blurred,
        }
    }
}

// ───────────────────────── Stage 2: Blurred ──────────────────────────

/// Pipeline state after Gaussian smoothing.
#[must_use = "pipeline stages are consumed by advancing — call .gradient() to continue"]
pub struct Blurred {
    config: DetectionConfig,
    original: RgbaImage,
    grayscale: GrayImage,
    blurred: GrayImage,
}

impl Blurred {
    /// The smoothed buffer.
    #[must_use]
    pub const fn blurred(&self) -> &GrayImage {
        &self.blurred
    }

    /// Compute the Sobel magnitude and advance to [`GradientComputed`].
    pub fn gradient(self) -> GradientComputed {
        let gradient = crate::edge::sobel_magnitude(&self.blurred);
        GradientComputed {
            config: self.config,
            original: self.original,
            grayscale: self.grayscale,
            blurred: self.blurred,
            gradient,
        }
    }
}

// ───────────────────────── Stage 3: GradientComputed ─────────────────

/// Pipeline state after the Sobel gradient.
#[must_use = "pipeline stages are consumed by advancing — call .threshold() to continue"]
pub struct GradientComputed {
    config: DetectionConfig,
    original: RgbaImage,
    grayscale: GrayImage,
    blurred: GrayImage,
    gradient: GrayImage,
}

impl GradientComputed {
    /// The gradient magnitude image.
    #[must_use]
    pub const fn gradient(&self) -> &GrayImage {
        &self.gradient
    }

    /// Binarize the gradient and advance to [`Thresholded`].
    pub fn threshold(self) -> Thresholded {
        let edges = crate::edge::threshold(&self.gradient, self.config.edge_threshold);
        Thresholded {
            config: self.config,
            original: self.original,
            grayscale: self.grayscale,
            blurred: self.blurred,
            gradient: self.gradient,
            edges,
        }
    }
}

// ───────────────────────── Stage 4: Thresholded ──────────────────────

/// Pipeline state holding the binary edge map.
#[must_use = "pipeline stages are consumed by advancing — call .trace_contours() to continue"]
pub struct Thresholded {
    config: DetectionConfig,
    original: RgbaImage,
    grayscale: GrayImage,
    blurred: GrayImage,
    gradient: GrayImage,
    edges: GrayImage,
}

impl Thresholded {
    /// The binary edge map.
    #[must_use]
    pub const fn edges(&self) -> &GrayImage {
        &self.edges
    }

    /// Trace connected edge regions and advance to [`ContoursTraced`].
    ///
    /// An edge map with no surviving regions is not an error; the
    /// remaining stages simply carry empty lists.
    pub fn trace_contours(self) -> ContoursTraced {
        let contours = self
            .config
            .contour_tracer
            .trace(&self.edges, self.config.min_contour_points);
        ContoursTraced {
            config: self.config,
            original: self.original,
            grayscale: self.grayscale,
            blurred: self.blurred,
            gradient: self.gradient,
            edges: self.edges,
            contours,
        }
    }
}

// ───────────────────────── Stage 5: ContoursTraced ───────────────────

/// Pipeline state after contour tracing.
#[must_use = "pipeline stages are consumed by advancing — call .simplify() to continue"]
pub struct ContoursTraced {
    config: DetectionConfig,
    original: RgbaImage,
    grayscale: GrayImage,
    blurred: GrayImage,
    gradient: GrayImage,
    edges: GrayImage,
    contours: Vec<Contour>,
}

impl ContoursTraced {
    /// The traced contours that survived the noise floor.
    #[must_use]
    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// Apply Douglas-Peucker to each contour and advance to [`Simplified`].
    pub fn simplify(self) -> Simplified {
        let simplified =
            crate::simplify::simplify_all(&self.contours, self.config.simplify_tolerance);
        Simplified {
            config: self.config,
            original: self.original,
            grayscale: self.grayscale,
            blurred: self.blurred,
            gradient: self.gradient,
            edges: self.edges,
            contours: self.contours,
            simplified,
        }
    }
}

// ───────────────────────── Stage 6: Simplified ───────────────────────

/// Pipeline state after contour simplification.
#[must_use = "pipeline stages are consumed by advancing — call .classify() to continue"]
pub struct Simplified {
    config: DetectionConfig,
    original: RgbaImage,
    grayscale: GrayImage,
    blurred: GrayImage,
    gradient: GrayImage,
    edges: GrayImage,
    contours: Vec<Contour>,
    simplified: Vec<Contour>,
}

impl Simplified {
    /// The simplified contours.
    #[must_use]
    pub fn simplified(&self) -> &[Contour] {
        &self.simplified
    }

    /// Classify each simplified contour and advance to [`Classified`].
    pub fn classify(self) -> Classified {
        let shapes = crate::classify::classify_all(&self.simplified);
        Classified {
            config: self.config,
            original: self.original,
            grayscale: self.grayscale,
            blurred: self.blurred,
            gradient: self.gradient,
            edges: self.edges,
            contours: self.contours,
            simplified: self.simplified,
            shapes,
        }
    }
}

// ───────────────────────── Stage 7: Classified ───────────────────────

/// Final pipeline state holding the shape records.
#[must_use = "call .into_result() to obtain the StagedResult"]
pub struct Classified {
    config: DetectionConfig,
    original: RgbaImage,
    grayscale: GrayImage,
    blurred: GrayImage,
    gradient: GrayImage,
    edges: GrayImage,
    contours: Vec<Contour>,
    simplified: Vec<Contour>,
    shapes: Vec<ShapeRecord>,
}

impl Classified {
    /// The classified shapes, in discovery order.
    #[must_use]
    pub fn shapes(&self) -> &[ShapeRecord] {
        &self.shapes
    }

    /// The configuration the pipeline ran with.
    #[must_use]
    pub const fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Consume the pipeline and return every intermediate.
    #[must_use]
    pub fn into_result(self) -> StagedResult {
        let dimensions = Dimensions {
            width: self.original.width(),
            height: self.original.height(),
        };
        StagedResult {
            original: self.original,
            grayscale: self.grayscale,
            blurred: self.blurred,
            gradient: self.gradient,
            edges: self.edges,
            contours: self.contours,
            simplified: self.simplified,
            shapes: self.shapes,
            dimensions,
        }
    }
}

// ──────────────────── PipelineStage trait + Stage enum ────────────────

/// Total number of stages in the pipeline.
pub const STAGE_COUNT: usize = 8;

/// The output produced by a single pipeline stage.
///
/// Each variant borrows the data that the corresponding stage computed.
#[must_use]
pub enum StageOutput<'a> {
    /// Source bitmap.
    Source {
        /// The bitmap the pipeline was created with.
        original: &'a RgbaImage,
    },
    /// Luminance buffer.
    Grayscale {
        /// The grayscale image.
        grayscale: &'a GrayImage,
    },
    /// Smoothed buffer.
    Blurred {
        /// The blurred image.
        blurred: &'a GrayImage,
    },
    /// Gradient magnitude.
    Gradient {
        /// The Sobel magnitude image.
        gradient: &'a GrayImage,
    },
    /// Binary edge map.
    Edges {
        /// 0/255 edge map.
        edges: &'a GrayImage,
    },
    /// Traced contours.
    Contours {
        /// Contours above the noise floor.
        contours: &'a [Contour],
    },
    /// Simplified contours.
    Simplified {
        /// Douglas-Peucker output.
        simplified: &'a [Contour],
    },
    /// Classified shapes.
    Shapes {
        /// The shape records.
        shapes: &'a [ShapeRecord],
    },
}

/// Trait implemented by every pipeline stage, enabling uniform iteration.
///
/// Each stage struct implements it, and [`Stage`] delegates to whichever
/// variant it holds.
///
/// # Loop pattern
///
/// ```rust
/// # use arealens_pipeline::{DetectionConfig, Pipeline, PipelineError, RgbaImage};
/// # use arealens_pipeline::pipeline::{Advance, Stage};
/// # fn run(bitmap: RgbaImage) -> Result<(), PipelineError> {
/// let mut stage: Stage = Pipeline::new(bitmap, DetectionConfig::default())?.into();
/// loop {
///     match stage.advance() {
///         Advance::Next(next) => stage = next,
///         Advance::Complete(done) => { stage = done; break; }
///     }
/// }
/// let result = stage.complete();
/// # Ok(())
/// # }
/// ```
pub trait PipelineStage: Sized {
    /// Short name of this stage (e.g. `"source"`, `"blur"`).
    const NAME: &str;

    /// Zero-based index of this stage.
    const INDEX: usize;

    /// The output this stage produced.
    fn output(&self) -> StageOutput<'_>;

    /// Metrics describing the output of this stage.
    fn metrics(&self) -> StageMetrics;

    /// Advance to the next stage, or `None` from the final stage.
    fn next(self) -> Option<Stage>;

    /// Run all remaining stages and return the final [`StagedResult`].
    fn complete(self) -> StagedResult;
}

impl PipelineStage for Pending {
    const NAME: &str = "source";
    const INDEX: usize = 0;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Source {
            original: &self.original,
        }
    }

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Source {
            width: self.original.width(),
            height: self.original.height(),
            pixel_count: u64::from(self.original.width()) * u64::from(self.original.height()),
        }
    }

    fn next(self) -> Option<Stage> {
        Some(self.grayscale().into())
    }

    fn complete(self) -> StagedResult {
        self.grayscale().complete()
    }
}

impl PipelineStage for Grayscaled {
    const NAME: &str = "grayscale";
    const INDEX: usize = 1;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Grayscale {
            grayscale: &self.grayscale,
        }
    }

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Grayscale {
            width: self.grayscale.width(),
            height: self.grayscale.height(),
        }
    }

    fn next(self) -> Option<Stage> {
        Some(self.blur().into())
    }

    fn complete(self) -> StagedResult {
        self.blur().complete()
    }
}

impl PipelineStage for Blurred {
    const NAME: &str = "blur";
    const INDEX: usize = 2;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Blurred {
            blurred: &self.blurred,
        }
    }

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Blur {
            mean_intensity: crate::diagnostics::mean_intensity(&self.blurred),
        }
    }

    fn next(self) -> Option<Stage> {
        Some(self.gradient().into())
    }

    fn complete(self) -> StagedResult {
        self.gradient().complete()
    }
}

impl PipelineStage for GradientComputed {
    const NAME: &str = "gradient";
    const INDEX: usize = 3;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Gradient {
            gradient: &self.gradient,
        }
    }

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Gradient {
            max_magnitude: self.gradient.pixels().map(|p| p.0[0]).max().unwrap_or(0),
            mean_magnitude: crate::diagnostics::mean_intensity(&self.gradient),
        }
    }

    fn next(self) -> Option<Stage> {
        Some(self.threshold().into())
    }

    fn complete(self) -> StagedResult {
        self.threshold().complete()
    }
}

impl PipelineStage for Thresholded {
    const NAME: &str = "threshold";
    const INDEX: usize = 4;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Edges { edges: &self.edges }
    }

    fn metrics(&self) -> StageMetrics {
        StageMetrics::Threshold {
            threshold: self.config.edge_threshold,
            edge_pixel_count: count_edge_pixels(&self.edges),
            total_pixel_count: u64::from(self.edges.width()) * u64::from(self.edges.height()),
        }
    }

    fn next(self) -> Option<Stage> {
        Some(self.trace_contours().into())
    }

    fn complete(self) -> StagedResult {
        self.trace_contours().complete()
    }
}

impl PipelineStage for ContoursTraced {
    const NAME: &str = "contours";
    const INDEX: usize = 5;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Contours {
            contours: &self.contours,
        }
    }

    fn metrics(&self) -> StageMetrics {
        let stats = contour_stats(&self.contours);
        StageMetrics::ContourTracing {
            tracer: format!("{:?}", self.config.contour_tracer),
            contour_count: self.contours.len(),
            total_point_count: stats.total,
            min_contour_points: stats.min,
            max_contour_points: stats.max,
            mean_contour_points: stats.mean,
        }
    }

    fn next(self) -> Option<Stage> {
        Some(self.simplify().into())
    }

    fn complete(self) -> StagedResult {
        self.simplify().complete()
    }
}

impl PipelineStage for Simplified {
    const NAME: &str = "simplify";
    const INDEX: usize = 6;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Simplified {
            simplified: &self.simplified,
        }
    }

    fn metrics(&self) -> StageMetrics {
        let before = total_points(&self.contours);
        let after = total_points(&self.simplified);
        #[allow(clippy::cast_precision_loss)]
        let reduction_ratio = if before > 0 {
            1.0 - after as f64 / before as f64
        } else {
            0.0
        };
        StageMetrics::Simplification {
            tolerance: self.config.simplify_tolerance,
            contour_count: self.simplified.len(),
            points_before: before,
            points_after: after,
            reduction_ratio,
        }
    }

    fn next(self) -> Option<Stage> {
        Some(self.classify().into())
    }

    fn complete(self) -> StagedResult {
        self.classify().complete()
    }
}

impl PipelineStage for Classified {
    const NAME: &str = "classify";
    const INDEX: usize = 7;

    fn output(&self) -> StageOutput<'_> {
        StageOutput::Shapes {
            shapes: &self.shapes,
        }
    }

    fn metrics(&self) -> StageMetrics {
        let count = |kind: ShapeKind| self.shapes.iter().filter(|s| s.kind() == kind).count();
        StageMetrics::Classification {
            shape_count: self.shapes.len(),
            dropped_count: self.simplified.len() - self.shapes.len(),
            rectangles: count(ShapeKind::Rectangle),
            circles: count(ShapeKind::Circle),
            triangles: count(ShapeKind::Triangle),
            polygons: count(ShapeKind::Polygon),
        }
    }

    fn next(self) -> Option<Stage> {
        None
    }

    fn complete(self) -> StagedResult {
        self.into_result()
    }
}

/// Type-erased pipeline stage, for driving the pipeline in a loop.
pub enum Stage {
    /// Stage 0.
    Pending(Pending),
    /// Stage 1.
    Grayscaled(Grayscaled),
    /// Stage 2.
    Blurred(Blurred),
    /// Stage 3.
    GradientComputed(GradientComputed),
    /// Stage 4.
    Thresholded(Thresholded),
    /// Stage 5.
    ContoursTraced(ContoursTraced),
    /// Stage 6.
    Simplified(Simplified),
    /// Stage 7.
    Classified(Classified),
}

/// Result of [`Stage::advance`].
pub enum Advance {
    /// The pipeline moved to this stage.
    Next(Stage),
    /// The pipeline was already complete; the final stage is returned.
    Complete(Stage),
}

macro_rules! delegate {
    ($self:ident, $method:ident $(, $arg:expr)*) => {
        match $self {
            Self::Pending(s) => s.$method($($arg),*),
            Self::Grayscaled(s) => s.$method($($arg),*),
            Self::Blurred(s) => s.$method($($arg),*),
            Self::GradientComputed(s) => s.$method($($arg),*),
            Self::Thresholded(s) => s.$method($($arg),*),
            Self::ContoursTraced(s) => s.$method($($arg),*),
            Self::Simplified(s) => s.$method($($arg),*),
            Self::Classified(s) => s.$method($($arg),*),
        }
    };
}

impl Stage {
    /// Short name of the current stage.
    #[must_use]
    pub fn name(&self) -> &'static str {
        delegate!(self, name)
    }

    /// Zero-based index of the current stage.
    #[must_use]
    pub fn index(&self) -> usize {
        delegate!(self, index)
    }

    /// The output this stage produced.
    pub fn output(&self) -> StageOutput<'_> {
        delegate!(self, output)
    }

    /// Stage-specific metrics for diagnostics.
    #[must_use]
    pub fn metrics(&self) -> StageMetrics {
        delegate!(self, metrics)
    }

    /// Whether the pipeline is at the final stage.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Self::Classified(_))
    }

    /// Advance to the next stage, or `None` if already complete (the
    /// final stage is consumed).
    #[must_use]
    pub fn next(self) -> Option<Self> {
        delegate!(self, next)
    }

    /// Advance to the next stage, handing the final stage back unchanged
    /// once complete.
    pub fn advance(self) -> Advance {
        match self {
            Self::Classified(_) => Advance::Complete(self),
            Self::Pending(s) => Advance::Next(s.grayscale().into()),
            Self::Grayscaled(s) => Advance::Next(s.blur().into()),
            Self::Blurred(s) => Advance::Next(s.gradient().into()),
            Self::GradientComputed(s) => Advance::Next(s.threshold().into()),
            Self::Thresholded(s) => Advance::Next(s.trace_contours().into()),
            Self::ContoursTraced(s) => Advance::Next(s.simplify().into()),
            Self::Simplified(s) => Advance::Next(s.classify().into()),
        }
    }

    /// Run all remaining stages to completion.
    #[must_use]
    pub fn complete(self) -> StagedResult {
        delegate!(self, complete)
    }
}

// Associated constants aren't reachable through `self`, so the macro
// goes through this helper.
trait StageMetadata {
    fn name(&self) -> &'static str;
    fn index(&self) -> usize;
}

impl<T: PipelineStage> StageMetadata for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn index(&self) -> usize {
        T::INDEX
    }
}

macro_rules! stage_from {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for Stage {
                fn from(s: $variant) -> Self {
                    Self::$variant(s)
                }
            }
        )*
    };
}

stage_from!(
    Pending,
    Grayscaled,
    Blurred,
    GradientComputed,
    Thresholded,
    ContoursTraced,
    Simplified,
    Classified
);

// ───────────────────── Pipeline entry point ──────────────────────────

/// Incremental shape detection pipeline.
///
/// Each stage method consumes the current state and returns the next,
/// making it a compile-time error to skip stages or call them out of
/// order.
pub struct Pipeline;

impl Pipeline {
    /// Create a new pipeline over a bitmap.
    ///
    /// No pixels are processed yet.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `config` fails
    /// [`DetectionConfig::validate`].
    #[allow(clippy::new_ret_no_self)]
    pub fn new(original: RgbaImage, config: DetectionConfig) -> Result<Pending, PipelineError> {
        config.validate()?;
        Ok(Pending { config, original })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// White filled rectangle on black, x in 10..50 and y in 8..30.
    fn filled_rect_bitmap() -> RgbaImage {
        RgbaImage::from_fn(60, 40, |x, y| {
            if (10..50).contains(&x) && (8..30).contains(&y) {
                image::Rgba([255, 255, 255, 255])
            } else {
                image::Rgba([0, 0, 0, 255])
            }
        })
    }

    // ─────────── Typed API tests ─────────────────────────────────

    #[test]
    fn typed_chain_produces_all_intermediates() {
        let staged = Pipeline::new(filled_rect_bitmap(), DetectionConfig::default())
            .unwrap()
            .grayscale()
            .blur()
            .gradient()
            .threshold()
            .trace_contours()
            .simplify()
            .classify()
            .into_result();

        assert_eq!(
            staged.dimensions,
            Dimensions {
                width: 60,
                height: 40
            }
        );
        assert_eq!(staged.grayscale.dimensions(), (60, 40));
        assert_eq!(staged.edges.dimensions(), (60, 40));
        assert_eq!(staged.contours.len(), staged.simplified.len());
        assert_eq!(staged.shapes.len(), 1);
    }

    #[test]
    fn accessors_expose_stage_outputs() {
        let pending = Pipeline::new(filled_rect_bitmap(), DetectionConfig::default()).unwrap();
        assert_eq!(pending.original().dimensions(), (60, 40));

        let gray = pending.grayscale();
        assert_eq!(gray.grayscale().get_pixel(20, 20).0[0], 255);

        let blurred = gray.blur();
        assert_eq!(blurred.blurred().get_pixel(0, 0).0[0], 0);

        let thresholded = blurred.gradient().threshold();
        assert!(
            thresholded
                .edges()
                .pixels()
                .all(|p| p.0[0] == 0 || p.0[0] == 255)
        );

        let traced = thresholded.trace_contours();
        assert!(
            traced
                .contours()
                .iter()
                .all(|c| c.len() >= DetectionConfig::DEFAULT_MIN_CONTOUR_POINTS)
        );
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = DetectionConfig {
            simplify_tolerance: -0.5,
            ..DetectionConfig::default()
        };
        assert!(matches!(
            Pipeline::new(filled_rect_bitmap(), config),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn black_bitmap_runs_to_empty_result() {
        let bitmap = RgbaImage::from_pixel(30, 30, image::Rgba([0, 0, 0, 255]));
        let staged = Pipeline::new(bitmap, DetectionConfig::default())
            .unwrap()
            .grayscale()
            .complete();
        assert!(staged.contours.is_empty());
        assert!(staged.shapes.is_empty());
    }

    // ─────────── PipelineStage trait + Stage enum tests ───────────

    #[test]
    fn stage_loop_visits_every_stage_in_order() {
        let mut stage: Stage = Pipeline::new(filled_rect_bitmap(), DetectionConfig::default())
            .unwrap()
            .into();
        let mut names = vec![stage.name()];
        loop {
            assert_eq!(stage.index(), names.len() - 1);
            match stage.advance() {
                Advance::Next(next) => {
                    stage = next;
                    names.push(stage.name());
                }
                Advance::Complete(done) => {
                    stage = done;
                    break;
                }
            }
        }
        assert_eq!(names.len(), STAGE_COUNT);
        assert_eq!(
            names,
            [
                "source",
                "grayscale",
                "blur",
                "gradient",
                "threshold",
                "contours",
                "simplify",
                "classify"
            ]
        );
        assert!(stage.is_complete());
        assert_eq!(stage.complete().shapes.len(), 1);
    }

    #[test]
    fn metrics_describe_each_stage() {
        let stage: Stage = Pipeline::new(filled_rect_bitmap(), DetectionConfig::default())
            .unwrap()
            .into();
        assert!(matches!(
            stage.metrics(),
            StageMetrics::Source {
                pixel_count: 2400,
                ..
            }
        ));

        let mut stage = stage.next().unwrap();
        while !stage.is_complete() {
            stage = stage.next().unwrap();
        }
        assert!(matches!(
            stage.metrics(),
            StageMetrics::Classification {
                shape_count: 1,
                dropped_count: 0,
                ..
            }
        ));
    }

    #[test]
    fn next_consumes_final_stage() {
        let done = Pipeline::new(filled_rect_bitmap(), DetectionConfig::default())
            .unwrap()
            .grayscale()
            .blur()
            .gradient()
            .threshold()
            .trace_contours()
            .simplify()
            .classify();
        let stage: Stage = done.into();
        assert!(matches!(stage.output(), StageOutput::Shapes { .. }));
        assert!(stage.next().is_none());
    }
}
