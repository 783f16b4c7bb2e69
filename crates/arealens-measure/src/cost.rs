//! Cost estimation from measured shapes.
//!
//! Three building blocks ([`basic_cost`], [`tiered_cost`],
//! [`quantity_discount`]) and one composite, [`complex_cost`], driven by a
//! serializable [`CostFormula`].
//!
//! [`complex_cost`] prices each shape as
//!
//! ```text
//! shape_cost = (area * area_cost + perimeter * perimeter_cost)
//!              * kind multiplier
//!              * polygon complexity factor
//! shape_cost = max(shape_cost, minimum_cost)
//! ```
//!
//! then adds the setup cost once and, for more than one shape, applies the
//! largest matching quantity discount to the total.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use arealens_pipeline::{Shape, ShapeKind};

use crate::MeasureError;
use crate::calculate::{area, perimeter};

/// A price band for [`tiered_cost`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostTier {
    /// Lower bound of the band.
    pub min: f64,
    /// Upper bound of the band.
    pub max: f64,
    /// Price per unit area inside the band.
    pub rate: f64,
}

/// Discount applied when at least `min` shapes are priced together.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantityDiscount {
    /// Minimum shape count for the discount to apply.
    pub min: usize,
    /// Fraction taken off the total, in `[0, 1]`.
    pub discount: f64,
}

/// Parameters for [`complex_cost`].
///
/// Every field defaults to "no effect", so a formula only lists what it
/// uses:
///
/// ```json
/// { "area_cost": 0.05, "setup_cost": 10, "shape_multipliers": { "circle": 1.2 } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostFormula {
    /// Pixels per unit used to measure shapes. Absent or zero means 1.
    pub scale: Option<f64>,

    /// Price per unit area.
    pub area_cost: f64,

    /// Price per unit of perimeter, e.g. for cutting.
    pub perimeter_cost: f64,

    /// Per-kind price multiplier. Kinds without an entry are not scaled.
    pub shape_multipliers: BTreeMap<ShapeKind, f64>,

    /// Extra cost per vertex beyond four, for polygons only.
    pub complexity_multiplier: f64,

    /// Floor on the cost of each shape.
    pub minimum_cost: f64,

    /// One-time cost added to the total.
    pub setup_cost: f64,

    /// Volume discounts; the largest applicable one wins.
    pub quantity_discounts: Vec<QuantityDiscount>,
}

impl CostFormula {
    /// Scale used to measure shapes.
    #[must_use]
    pub fn effective_scale(&self) -> f64 {
        match self.scale {
            Some(scale) if scale != 0.0 => scale,
            _ => 1.0,
        }
    }

    /// Check the formula for values that cannot price anything sensibly.
    ///
    /// # Errors
    ///
    /// Returns [`MeasureError::InvalidCostFormula`] naming the first field
    /// that is negative or not finite, or a discount outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), MeasureError> {
        if let Some(scale) = self.scale
            && !scale.is_finite()
        {
            return Err(MeasureError::InvalidCostFormula(format!(
                "scale must be finite, got {scale}"
            )));
        }

        let rates = [
            ("area_cost", self.area_cost),
            ("perimeter_cost", self.perimeter_cost),
            ("complexity_multiplier", self.complexity_multiplier),
            ("minimum_cost", self.minimum_cost),
            ("setup_cost", self.setup_cost),
        ];
        for (name, value) in rates {
            check_rate(name, value)?;
        }

        for (kind, &multiplier) in &self.shape_multipliers {
            check_rate(&format!("shape_multipliers.{kind}"), multiplier)?;
        }

        for tier in &self.quantity_discounts {
            if !(0.0..=1.0).contains(&tier.discount) {
                return Err(MeasureError::InvalidCostFormula(format!(
                    "discount for {} shapes must be between 0 and 1, got {}",
                    tier.min, tier.discount
                )));
            }
        }

        Ok(())
    }
}

fn check_rate(name: &str, value: f64) -> Result<(), MeasureError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(MeasureError::InvalidCostFormula(format!(
            "{name} must be a non-negative number, got {value}"
        )))
    }
}

/// Flat price: `area * rate`.
#[must_use]
pub fn basic_cost(area: f64, rate: f64) -> f64 {
    area * rate
}

/// Price `area` band by band.
///
/// Bands are consumed in the order given, each absorbing up to
/// `max - min` units of the remaining area at its own rate. Area left over
/// after the last band is not charged.
#[must_use]
pub fn tiered_cost(area: f64, tiers: &[CostTier]) -> f64 {
    let mut total = 0.0;
    let mut remaining = area;

    for tier in tiers {
        if remaining <= 0.0 {
            break;
        }
        let in_tier = remaining.min((tier.max - tier.min).max(0.0));
        total += in_tier * tier.rate;
        remaining -= in_tier;
    }

    total
}

/// Largest discount whose threshold `count` reaches, or 0.
#[must_use]
pub fn quantity_discount(count: usize, discounts: &[QuantityDiscount]) -> f64 {
    discounts
        .iter()
        .filter(|tier| count >= tier.min)
        .map(|tier| tier.discount)
        .fold(0.0, f64::max)
}

/// Price a batch of shapes with `formula`.
///
/// # Errors
///
/// Returns [`MeasureError::InvalidCostFormula`] if `formula` fails
/// [`CostFormula::validate`].
pub fn complex_cost(shapes: &[Shape], formula: &CostFormula) -> Result<f64, MeasureError> {
    formula.validate()?;

    let scale = formula.effective_scale();
    let mut total: f64 = shapes.iter().map(|s| shape_cost(s, scale, formula)).sum();

    total += formula.setup_cost;

    if shapes.len() > 1 {
        total *= 1.0 - quantity_discount(shapes.len(), &formula.quantity_discounts);
    }

    Ok(total)
}

fn shape_cost(shape: &Shape, scale: f64, formula: &CostFormula) -> f64 {
    let mut cost =
        area(shape, scale) * formula.area_cost + perimeter(shape, scale) * formula.perimeter_cost;

    if let Some(multiplier) = formula.shape_multipliers.get(&shape.kind()) {
        cost *= multiplier;
    }

    if let Shape::Polygon { vertices } = shape {
        // Normalized so a four-vertex polygon is not penalized.
        #[allow(clippy::cast_precision_loss)]
        let complexity = vertices.len() as f64 / 4.0;
        cost *= (complexity - 1.0).mul_add(formula.complexity_multiplier, 1.0);
    }

    cost.max(formula.minimum_cost)
}
