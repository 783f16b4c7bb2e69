//! Length units, conversion and scale calibration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use arealens_pipeline::Point;

use crate::MeasureError;

/// Real-world length unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Millimetre, the base unit.
    #[default]
    Mm,
    /// Centimetre.
    Cm,
    /// Metre.
    M,
    /// Inch.
    In,
    /// Foot.
    Ft,
}

impl Unit {
    /// Every supported unit.
    pub const ALL: [Self; 5] = [Self::Mm, Self::Cm, Self::M, Self::In, Self::Ft];

    /// Length of one of this unit in millimetres.
    #[must_use]
    pub const fn millimetres(self) -> f64 {
        match self {
            Self::Mm => 1.0,
            Self::Cm => 10.0,
            Self::M => 1000.0,
            Self::In => 25.4,
            Self::Ft => 304.8,
        }
    }

    /// Short symbol, e.g. `"mm"`.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Mm => "mm",
            Self::Cm => "cm",
            Self::M => "m",
            Self::In => "in",
            Self::Ft => "ft",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = MeasureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|unit| unit.symbol().eq_ignore_ascii_case(name))
            .ok_or_else(|| MeasureError::UnknownUnit(name.to_string()))
    }
}

/// Convert a length between units.
#[must_use]
pub fn convert(value: f64, from: Unit, to: Unit) -> f64 {
    value * from.millimetres() / to.millimetres()
}

/// Convert an area between units (the linear factor squared).
#[must_use]
pub fn convert_area(value: f64, from: Unit, to: Unit) -> f64 {
    let factor = from.millimetres() / to.millimetres();
    value * factor * factor
}

/// Derive a scale from two image points a known distance apart.
///
/// Returns pixels per unit of `real_length`, ready to pass as `scale` to
/// [`area`](crate::area) and [`perimeter`](crate::perimeter).
///
/// # Errors
///
/// Returns [`MeasureError::InvalidCalibration`] if `real_length` is not a
/// positive finite number or the two points coincide.
pub fn calibrate(p1: Point, p2: Point, real_length: f64) -> Result<f64, MeasureError> {
    if !real_length.is_finite() || real_length <= 0.0 {
        return Err(MeasureError::InvalidCalibration(format!(
            "real length must be a positive number, got {real_length}"
        )));
    }
    let pixels = p1.distance(p2);
    if !pixels.is_finite() || pixels == 0.0 {
        return Err(MeasureError::InvalidCalibration(
            "calibration points must be distinct".to_string(),
        ));
    }
    Ok(pixels / real_length)
}
