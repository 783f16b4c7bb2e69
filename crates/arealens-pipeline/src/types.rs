//! Shared types for the arealens detection pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contour::ContourTracerKind;

/// Re-export `GrayImage` so downstream crates can reference
/// intermediate raster data without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbaImage` so downstream crates can reference the
/// input bitmap without depending on `image` directly.
pub use image::RgbaImage;

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// An ordered sequence of points belonging to one traced region.
///
/// Contours produced by the flood-fill tracer are in visiting order, not
/// geometric order. After simplification the same type carries the
/// reduced outline handed to the classifier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
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
    /// Total pixel count.
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Tag identifying which [`Shape`] variant a value holds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    /// Axis-aligned rectangle.
    Rectangle,
    /// Circle.
    Circle,
    /// Three-vertex polygon.
    Triangle,
    /// Generic closed polygon.
    Polygon,
}

impl ShapeKind {
    /// Every kind, in classification order.
    pub const ALL: [Self; 4] = [Self::Rectangle, Self::Circle, Self::Triangle, Self::Polygon];

    /// Lowercase name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Circle => "circle",
            Self::Triangle => "triangle",
            Self::Polygon => "polygon",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A geometric shape in pixel space.
///
/// Produced by the classifier for detected contours, and constructed
/// directly by callers for manually drawn regions. Each variant carries
/// only the fields meaningful for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    /// Axis-aligned box. Detected rectangles report the bounding box of
    /// their four corners, so rotated quads come out inflated.
    Rectangle {
        /// Left edge.
        x: f64,
        /// Top edge.
        y: f64,
        /// Horizontal extent.
        width: f64,
        /// Vertical extent.
        height: f64,
    },
    /// Circle given by center and radius.
    Circle {
        /// Center point.
        center: Point,
        /// Radius in pixels.
        radius: f64,
    },
    /// Triangle given by its three vertices.
    Triangle {
        /// Vertices in contour order.
        vertices: [Point; 3],
    },
    /// Closed polygon given by its vertices.
    Polygon {
        /// Vertices in contour order; the closing edge is implicit.
        vertices: Vec<Point>,
    },
}

impl Shape {
    /// The variant tag of this shape.
    #[must_use]
    pub const fn kind(&self) -> ShapeKind {
        match self {
            Self::Rectangle { .. } => ShapeKind::Rectangle,
            Self::Circle { .. } => ShapeKind::Circle,
            Self::Triangle { .. } => ShapeKind::Triangle,
            Self::Polygon { .. } => ShapeKind::Polygon,
        }
    }

    /// Vertex list for triangles and polygons, `None` otherwise.
    #[must_use]
    pub fn vertices(&self) -> Option<&[Point]> {
        match self {
            Self::Triangle { vertices } => Some(vertices),
            Self::Polygon { vertices } => Some(vertices),
            Self::Rectangle { .. } | Self::Circle { .. } => None,
        }
    }
}

/// One classified shape produced by the detection pipeline.
///
/// Carries the classified geometry together with the simplified contour it
/// was derived from. Records are immutable once produced; presentation
/// metadata (colors, selection) belongs to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeRecord {
    /// The classified shape.
    pub shape: Shape,
    /// The Douglas-Peucker simplified contour behind the classification.
    pub outline: Contour,
}

impl ShapeRecord {
    /// The variant tag of the classified shape.
    #[must_use]
    pub const fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }
}

/// Configuration for the detection pipeline.
///
/// Defaults reproduce the fixed constants of the detector: edge threshold
/// 50, a 10-pixel noise floor and a 2-pixel simplification tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Gradient magnitudes strictly greater than this become edge pixels.
    pub edge_threshold: u8,

    /// Contours with fewer traced pixels are discarded as noise.
    pub min_contour_points: usize,

    /// Douglas-Peucker perpendicular-distance tolerance in pixels.
    pub simplify_tolerance: f64,

    /// Which contour tracing algorithm to use.
    pub contour_tracer: ContourTracerKind,
}

impl DetectionConfig {
    /// Default gradient threshold.
    pub const DEFAULT_EDGE_THRESHOLD: u8 = 50;
    /// Default contour noise floor.
    pub const DEFAULT_MIN_CONTOUR_POINTS: usize = 10;
    /// Default Douglas-Peucker tolerance.
    pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 2.0;

    /// Check the configuration for values the pipeline cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `simplify_tolerance` is
    /// negative or not finite, or if `min_contour_points` is zero.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if !self.simplify_tolerance.is_finite() || self.simplify_tolerance < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "simplify_tolerance must be finite and non-negative, got {}",
                self.simplify_tolerance,
            )));
        }
        if self.min_contour_points == 0 {
            return Err(PipelineError::InvalidConfig(
                "min_contour_points must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            edge_threshold: Self::DEFAULT_EDGE_THRESHOLD,
            min_contour_points: Self::DEFAULT_MIN_CONTOUR_POINTS,
            simplify_tolerance: Self::DEFAULT_SIMPLIFY_TOLERANCE,
            contour_tracer: ContourTracerKind::default(),
        }
    }
}

/// Result of running detection on an encoded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Shape records in discovery (raster scan) order.
    pub shapes: Vec<ShapeRecord>,

    /// Dimensions of the source image in pixels.
    pub dimensions: Dimensions,
}

/// Result of running the pipeline with all intermediate stage outputs preserved.
///
/// Uses custom `Serialize`/`Deserialize` implementations because
/// `GrayImage` and `RgbaImage` (from the `image` crate) do not
/// implement serde traits. Raster images are serialized as
/// `(width, height, raw_pixels)` tuples.
#[derive(Debug, Clone)]
pub struct StagedResult {
    /// Stage 0: source RGBA bitmap.
    pub original: RgbaImage,
    /// Stage 1: luminance buffer.
    pub grayscale: GrayImage,
    /// Stage 2: 3x3 Gaussian-smoothed buffer.
    pub blurred: GrayImage,
    /// Stage 3: Sobel gradient magnitude.
    pub gradient: GrayImage,
    /// Stage 4: binary edge map (0 or 255).
    pub edges: GrayImage,
    /// Stage 5: traced contours that survived the noise floor.
    pub contours: Vec<Contour>,
    /// Stage 6: Douglas-Peucker simplified contours.
    pub simplified: Vec<Contour>,
    /// Stage 7: classified shapes.
    pub shapes: Vec<ShapeRecord>,
    /// Source image dimensions in pixels.
    pub dimensions: Dimensions,
}

/// Serde-compatible proxy for `StagedResult`.
#[derive(Serialize, Deserialize)]
struct StagedResultProxy {
    original: (u32, u32, Vec<u8>),
    grayscale: (u32, u32, Vec<u8>),
    blurred: (u32, u32, Vec<u8>),
    gradient: (u32, u32, Vec<u8>),
    edges: (u32, u32, Vec<u8>),
    contours: Vec<Contour>,
    simplified: Vec<Contour>,
    shapes: Vec<ShapeRecord>,
    dimensions: Dimensions,
}

fn gray_parts(image: &GrayImage) -> (u32, u32, Vec<u8>) {
    (image.width(), image.height(), image.as_raw().clone())
}

fn gray_from_parts<E: serde::de::Error>(
    parts: (u32, u32, Vec<u8>),
    what: &str,
) -> Result<GrayImage, E> {
    GrayImage::from_raw(parts.0, parts.1, parts.2)
        .ok_or_else(|| E::custom(format!("invalid {what} image dimensions")))
}

impl Serialize for StagedResult {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = StagedResultProxy {
            original: (
                self.original.width(),
                self.original.height(),
                self.original.as_raw().clone(),
            ),
            grayscale: gray_parts(&self.grayscale),
            blurred: gray_parts(&self.blurred),
            gradient: gray_parts(&self.gradient),
            edges: gray_parts(&self.edges),
            contours: self.contours.clone(),
            simplified: self.simplified.clone(),
            shapes: self.shapes.clone(),
            dimensions: self.dimensions,
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StagedResult {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = StagedResultProxy::deserialize(deserializer)?;

        let original = RgbaImage::from_raw(proxy.original.0, proxy.original.1, proxy.original.2)
            .ok_or_else(|| serde::de::Error::custom("invalid RGBA image dimensions"))?;

        Ok(Self {
            original,
            grayscale: gray_from_parts(proxy.grayscale, "grayscale")?,
            blurred: gray_from_parts(proxy.blurred, "blurred")?,
            gradient: gray_from_parts(proxy.gradient, "gradient")?,
            edges: gray_from_parts(proxy.edges, "edges")?,
            contours: proxy.contours,
            simplified: proxy.simplified,
            shapes: proxy.shapes,
            dimensions: proxy.dimensions,
        })
    }
}

/// Errors that can occur at the pipeline boundary.
///
/// Geometric degeneracy (tiny contours, unclassifiable outlines) is never
/// an error; such contours are dropped silently. Only malformed input and
/// unusable configuration are reported.
///
/// Uses custom `Serialize`/`Deserialize` because `image::ImageError`
/// does not implement serde traits. The `ImageDecode` variant is
/// serialized as its `Display` string.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty, or a bitmap had a zero dimension.
    #[error("input image data is empty")]
    EmptyInput,

    /// A raw pixel buffer does not match its declared dimensions.
    #[error("invalid {width}x{height} bitmap: expected {expected} bytes, got {actual}")]
    InvalidDimensions {
        /// Declared width in pixels.
        width: u32,
        /// Declared height in pixels.
        height: u32,
        /// Buffer length implied by the dimensions and channel count.
        expected: usize,
        /// Length of the buffer actually supplied.
        actual: usize,
    },

    /// Detection configuration is invalid.
    #[error("invalid detection configuration: {0}")]
    InvalidConfig(String),
}

/// Serde-compatible proxy for `PipelineError`.
#[derive(Serialize, Deserialize)]
enum PipelineErrorProxy {
    ImageDecode(String),
    EmptyInput,
    InvalidDimensions {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    InvalidConfig(String),
}

impl Serialize for PipelineError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let proxy = match self {
            Self::ImageDecode(e) => PipelineErrorProxy::ImageDecode(e.to_string()),
            Self::EmptyInput => PipelineErrorProxy::EmptyInput,
            Self::InvalidDimensions {
                width,
                height,
                expected,
                actual,
            } => PipelineErrorProxy::InvalidDimensions {
                width: *width,
                height: *height,
                expected: *expected,
                actual: *actual,
            },
            Self::InvalidConfig(s) => PipelineErrorProxy::InvalidConfig(s.clone()),
        };
        proxy.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PipelineError {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let proxy = PipelineErrorProxy::deserialize(deserializer)?;
        Ok(match proxy {
            // The typed image error cannot be rebuilt; keep its message.
            PipelineErrorProxy::ImageDecode(msg) => {
                Self::InvalidConfig(format!("image decode error: {msg}"))
            }
            PipelineErrorProxy::EmptyInput => Self::EmptyInput,
            PipelineErrorProxy::InvalidDimensions {
                width,
                height,
                expected,
                actual,
            } => Self::InvalidDimensions {
                width,
                height,
                expected,
                actual,
            },
            PipelineErrorProxy::InvalidConfig(s) => Self::InvalidConfig(s),
        })
    }
}
