//! Human-readable measurement strings.
//!
//! `None` as the unit means the value is in pixels.

use crate::units::Unit;

fn unit_symbol(unit: Option<Unit>) -> &'static str {
    unit.map_or("px", Unit::symbol)
}

/// Format an area, e.g. `"12.50 mm²"`.
#[must_use]
pub fn format_area(value: f64, unit: Option<Unit>, decimals: usize) -> String {
    format!("{value:.decimals$} {}²", unit_symbol(unit))
}

/// Format a length, e.g. `"3.00 mm"`.
#[must_use]
pub fn format_perimeter(value: f64, unit: Option<Unit>, decimals: usize) -> String {
    format!("{value:.decimals$} {}", unit_symbol(unit))
}

/// Format a cost with a leading currency symbol, e.g. `"$4.20"`.
#[must_use]
pub fn format_cost(value: f64, currency: &str, decimals: usize) -> String {
    format!("{currency}{value:.decimals$}")
}
