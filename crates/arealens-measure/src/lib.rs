//! arealens-measure: Real-world measurements for detected shapes (sans-IO).
//!
//! Converts pixel-space [`Shape`](arealens_pipeline::Shape)s into calibrated
//! areas and perimeters, aggregates statistics over a collection, converts
//! between length units and estimates material or cutting cost.
//!
//! Every entry point is a pure function over plain data. Scale is given in
//! pixels per real-world unit; a scale that is not a positive finite number
//! means "uncalibrated" and the pixel-space value is returned unchanged.

use serde::{Deserialize, Serialize};

pub mod calculate;
pub mod cost;
pub mod format;
pub mod stats;
pub mod units;

pub use calculate::{
    area, is_calibrated, perimeter, pixel_area, pixel_perimeter, record_area, record_perimeter,
    validate_scale, validate_shape,
};
pub use cost::{
    CostFormula, CostTier, QuantityDiscount, basic_cost, complex_cost, quantity_discount,
    tiered_cost,
};
pub use format::{format_area, format_cost, format_perimeter};
pub use stats::{Statistics, statistics};
pub use units::{Unit, calibrate, convert, convert_area};

/// Errors reported by measurement validation.
///
/// Measurement itself never fails: degenerate shapes measure as zero and
/// uncalibrated scales fall back to pixels. These variants surface from the
/// explicit validation entry points so callers can decide whether to reject
/// or warn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum MeasureError {
    /// Scale is zero, negative or not finite.
    #[error("scale must be a positive number, got {0}")]
    InvalidScale(f64),

    /// A rectangle has a zero or negative side.
    #[error("rectangle must have positive width and height")]
    NonPositiveDimensions,

    /// A circle has a zero or negative radius.
    #[error("circle must have positive radius")]
    NonPositiveRadius,

    /// A polygon has fewer than three vertices.
    #[error("polygon must have at least 3 points, got {count}")]
    TooFewVertices {
        /// Number of vertices supplied.
        count: usize,
    },

    /// A calibration measurement cannot produce a usable scale.
    #[error("invalid calibration: {0}")]
    InvalidCalibration(String),

    /// A unit name is not one of mm, cm, m, in, ft.
    #[error("unsupported unit: {0:?}")]
    UnknownUnit(String),

    /// A cost formula contains an unusable value.
    #[error("invalid cost formula: {0}")]
    InvalidCostFormula(String),
}
