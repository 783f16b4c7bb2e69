//! Aggregate measurements over a collection of shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use arealens_pipeline::{Shape, ShapeKind};

use crate::calculate::{area, perimeter};

/// Summary of a shape collection at one scale.
///
/// All values are zero for an empty collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// Sum of all areas.
    pub total_area: f64,
    /// Sum of all perimeters.
    pub total_perimeter: f64,
    /// Mean area.
    pub average_area: f64,
    /// Mean perimeter.
    pub average_perimeter: f64,
    /// Smallest area.
    pub min_area: f64,
    /// Largest area.
    pub max_area: f64,
    /// Smallest perimeter.
    pub min_perimeter: f64,
    /// Largest perimeter.
    pub max_perimeter: f64,
    /// Number of shapes measured.
    pub shape_count: usize,
    /// Number of shapes of each kind present. Absent kinds have no entry.
    pub counts_by_kind: BTreeMap<ShapeKind, usize>,
}

/// Measure every shape at `scale` and summarize.
#[must_use]
pub fn statistics(shapes: &[Shape], scale: f64) -> Statistics {
    if shapes.is_empty() {
        return Statistics::default();
    }

    let areas: Vec<f64> = shapes.iter().map(|s| area(s, scale)).collect();
    let perimeters: Vec<f64> = shapes.iter().map(|s| perimeter(s, scale)).collect();

    let mut counts_by_kind = BTreeMap::new();
    for shape in shapes {
        *counts_by_kind.entry(shape.kind()).or_insert(0) += 1;
    }

    let total_area: f64 = areas.iter().sum();
    let total_perimeter: f64 = perimeters.iter().sum();
    #[allow(clippy::cast_precision_loss)]
    let n = shapes.len() as f64;

    Statistics {
        total_area,
        total_perimeter,
        average_area: total_area / n,
        average_perimeter: total_perimeter / n,
        min_area: fold_min(&areas),
        max_area: fold_max(&areas),
        min_perimeter: fold_min(&perimeters),
        max_perimeter: fold_max(&perimeters),
        shape_count: shapes.len(),
        counts_by_kind,
    }
}

fn fold_min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

fn fold_max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
