//! JSON measurement report.
//!
//! [`analyze`] runs detection and measurement in one call and packages the
//! result as an [`AnalysisReport`], the structure written by `--json` and
//! by "export data" style downloads.

use serde::{Deserialize, Serialize};

use arealens_measure::{Statistics, is_calibrated, record_area, record_perimeter, statistics};
use arealens_pipeline::{
    Contour, DetectionConfig, Dimensions, RgbaImage, Shape, ShapeKind, ShapeRecord,
};

use crate::ExportError;

/// Source image facts carried in a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixels per real-world unit as supplied by the caller.
    pub scale: f64,
    /// Whether `scale` was usable. When false, measurements are in pixels.
    pub calibrated: bool,
}

/// One detected shape with its measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasuredShape {
    /// 1-based sequence number, matching the SVG labels.
    pub index: usize,
    /// Shape variant.
    pub kind: ShapeKind,
    /// Area in square units (or square pixels when uncalibrated).
    pub area: f64,
    /// Perimeter in units (or pixels when uncalibrated).
    pub perimeter: f64,
    /// Classified geometry in pixel space.
    pub shape: Shape,
    /// Simplified contour behind the classification.
    pub outline: Contour,
}

/// Full analysis of one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Version of the crate that produced the report.
    pub version: String,
    /// Source image facts.
    pub image: ImageInfo,
    /// Shapes in discovery order.
    pub shapes: Vec<MeasuredShape>,
    /// Sum of all shape areas.
    pub total_area: f64,
    /// Sum of all shape perimeters.
    pub total_perimeter: f64,
    /// Aggregate statistics over `shapes`.
    pub statistics: Statistics,
}

impl AnalysisReport {
    /// Measure already-detected records.
    #[must_use]
    pub fn from_records(records: &[ShapeRecord], dimensions: Dimensions, scale: f64) -> Self {
        let shapes: Vec<MeasuredShape> = records
            .iter()
            .enumerate()
            .map(|(i, record)| MeasuredShape {
                index: i + 1,
                kind: record.kind(),
                area: record_area(record, scale),
                perimeter: record_perimeter(record, scale),
                shape: record.shape.clone(),
                outline: record.outline.clone(),
            })
            .collect();

        let geometry: Vec<Shape> = records.iter().map(|r| r.shape.clone()).collect();
        let statistics = statistics(&geometry, scale);

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            image: ImageInfo {
                width: dimensions.width,
                height: dimensions.height,
                scale,
                calibrated: is_calibrated(scale),
            },
            total_area: statistics.total_area,
            total_perimeter: statistics.total_perimeter,
            shapes,
            statistics,
        }
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::Json`] if serialization fails. Non-finite
    /// values serialize as `null`, so this does not fail for any report
    /// built by this crate.
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Detect shapes in `image` and measure them at `scale`.
///
/// # Errors
///
/// Returns [`ExportError::Pipeline`] if `config` is invalid.
pub fn analyze(
    image: &RgbaImage,
    scale: f64,
    config: &DetectionConfig,
) -> Result<AnalysisReport, ExportError> {
    let records = arealens_pipeline::detect_shapes(image, config)?;
    let dimensions = Dimensions {
        width: image.width(),
        height: image.height(),
    };
    Ok(AnalysisReport::from_records(&records, dimensions, scale))
}
