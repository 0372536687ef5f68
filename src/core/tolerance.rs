//! Tolerance evaluation for measurement points
//!
//! A measurement passes when its deviation from spec lies inside the
//! inclusive window `[-minus, +plus]`. Minus tolerances are stored signed in
//! some exports and unsigned in others, so only their magnitude is used.

use serde::{Deserialize, Serialize};

use crate::core::fraction::{decimal_to_fraction_with, fraction_to_decimal, DEFAULT_DENOMINATOR};
use crate::entities::inspection::{MeasurementPoint, PointResult};

/// Slack for floating-point noise at the window edges
const EDGE_EPSILON: f64 = 1e-9;

/// Which side of the tolerance window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToleranceSide {
    Plus,
    Minus,
}

impl std::fmt::Display for ToleranceSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToleranceSide::Plus => write!(f, "plus"),
            ToleranceSide::Minus => write!(f, "minus"),
        }
    }
}

/// Outcome of checking one measured value against its window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum Verdict {
    Pass { deviation: f64 },
    Fail { deviation: f64, side: ToleranceSide },
}

impl Verdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass { .. })
    }

    pub fn deviation(&self) -> f64 {
        match self {
            Verdict::Pass { deviation } | Verdict::Fail { deviation, .. } => *deviation,
        }
    }

    /// Side of the window that was broken, if any
    pub fn failed_side(&self) -> Option<ToleranceSide> {
        match self {
            Verdict::Pass { .. } => None,
            Verdict::Fail { side, .. } => Some(*side),
        }
    }

    pub fn as_result(&self) -> PointResult {
        if self.is_pass() {
            PointResult::Pass
        } else {
            PointResult::Fail
        }
    }
}

/// Check a measured value against `spec` with tolerances `minus`/`plus`
pub fn evaluate(spec: f64, minus: f64, plus: f64, measured: f64) -> Verdict {
    let deviation = measured - spec;
    if deviation > plus.abs() + EDGE_EPSILON {
        Verdict::Fail {
            deviation,
            side: ToleranceSide::Plus,
        }
    } else if deviation < -minus.abs() - EDGE_EPSILON {
        Verdict::Fail {
            deviation,
            side: ToleranceSide::Minus,
        }
    } else {
        Verdict::Pass { deviation }
    }
}

/// Display string for one side of a point's tolerance
///
/// Prefers the stored fraction text, falls back to converting the decimal
/// tolerance, and returns `"0"` when neither is present.
pub fn tolerance_as_fraction(point: &MeasurementPoint, side: ToleranceSide) -> String {
    tolerance_as_fraction_with(point, side, DEFAULT_DENOMINATOR)
}

pub fn tolerance_as_fraction_with(
    point: &MeasurementPoint,
    side: ToleranceSide,
    denominator: u32,
) -> String {
    let (fraction, decimal) = match side {
        ToleranceSide::Plus => (&point.tolerance_plus_fraction, point.tolerance_plus),
        ToleranceSide::Minus => (&point.tolerance_minus_fraction, point.tolerance_minus),
    };

    if let Some(text) = fraction.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        return text.to_string();
    }
    match decimal {
        Some(value) => decimal_to_fraction_with(value.abs(), denominator),
        None => "0".to_string(),
    }
}

/// Spec value of a point as a decimal, accepting decimal or fraction text
pub fn spec_decimal(point: &MeasurementPoint) -> Option<f64> {
    fraction_to_decimal(&point.specs).ok()
}

/// Measured value of a point as a decimal
///
/// Falls back to the fraction text when the decimal field is missing.
pub fn measured_decimal(point: &MeasurementPoint) -> Option<f64> {
    point.measured_value_decimal.or_else(|| {
        point
            .measured_value_fraction
            .as_deref()
            .and_then(|f| fraction_to_decimal(f).ok())
    })
}

/// Evaluate a stored point; `None` when spec or measurement is missing
pub fn evaluate_point(point: &MeasurementPoint) -> Option<Verdict> {
    let spec = spec_decimal(point)?;
    let measured = measured_decimal(point)?;
    Some(evaluate(
        spec,
        point.tolerance_minus.unwrap_or(0.0),
        point.tolerance_plus.unwrap_or(0.0),
        measured,
    ))
}

/// Stored result, or the evaluated one when the document has none
pub fn effective_result(point: &MeasurementPoint) -> PointResult {
    point
        .result
        .or_else(|| evaluate_point(point).map(|v| v.as_result()))
        .unwrap_or(PointResult::Fail)
}
