//! Fractional-inch conversion
//!
//! Garment measurements are captured in decimal inches and displayed as
//! fractions of an inch (sixteenths unless configured otherwise).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default display denominator (sixteenths of an inch)
pub const DEFAULT_DENOMINATOR: u32 = 16;

/// Errors from parsing fraction text
#[derive(Debug, Error, PartialEq)]
pub enum FractionError {
    #[error("empty fraction text")]
    Empty,

    #[error("'{0}' is not a fraction or decimal")]
    Invalid(String),

    #[error("'{0}' has a zero denominator")]
    ZeroDenominator(String),
}

/// Convert a decimal to the nearest sixteenth, e.g. `1.125 -> "1 1/8"`
pub fn decimal_to_fraction(decimal: f64) -> String {
    decimal_to_fraction_with(decimal, DEFAULT_DENOMINATOR)
}

/// Convert a decimal to the nearest fraction with the given denominator
///
/// The result is reduced to lowest terms. Zero renders as `"0"`, whole numbers
/// without a fraction part, and negative values with a leading `-`. Halfway
/// cases round away from zero.
pub fn decimal_to_fraction_with(decimal: f64, denominator: u32) -> String {
    if !decimal.is_finite() {
        return "0".to_string();
    }
    let denominator = u64::from(denominator.max(1));

    let negative = decimal < 0.0;
    let magnitude = decimal.abs();
    let mut whole = magnitude.trunc() as u64;
    let mut numerator = ((magnitude - magnitude.trunc()) * denominator as f64).round() as u64;

    // Rounding can carry into the whole part (0.999 -> 1)
    if numerator >= denominator {
        whole += 1;
        numerator = 0;
    }

    let body = if numerator == 0 {
        whole.to_string()
    } else {
        let divisor = gcd(numerator, denominator);
        let (n, d) = (numerator / divisor, denominator / divisor);
        if whole == 0 {
            format!("{}/{}", n, d)
        } else {
            format!("{} {}/{}", whole, n, d)
        }
    };

    if negative && body != "0" {
        format!("-{}", body)
    } else {
        body
    }
}

/// Parse `"1/8"`, `"1 1/4"`, `"-3/16"`, `"+1/2"`, `"10"`, `"10.5"` (an optional
/// trailing inch mark is ignored)
pub fn fraction_to_decimal(text: &str) -> Result<f64, FractionError> {
    let trimmed = text.trim().trim_end_matches('"').trim();
    if trimmed.is_empty() {
        return Err(FractionError::Empty);
    }

    let (sign, unsigned) = match trimmed.as_bytes()[0] {
        b'-' => (-1.0, trimmed[1..].trim_start()),
        b'+' => (1.0, trimmed[1..].trim_start()),
        _ => (1.0, trimmed),
    };
    if unsigned.is_empty() {
        return Err(FractionError::Invalid(text.to_string()));
    }

    let invalid = || FractionError::Invalid(text.to_string());
    let parts: Vec<&str> = unsigned.split_whitespace().collect();

    let value = match parts.as_slice() {
        [single] if single.contains('/') => parse_ratio(single, text)?,
        [single] => single.parse::<f64>().map_err(|_| invalid())?,
        [whole, ratio] if ratio.contains('/') => {
            let whole = whole.parse::<u64>().map_err(|_| invalid())? as f64;
            whole + parse_ratio(ratio, text)?
        }
        _ => return Err(invalid()),
    };

    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(sign * value)
}

fn parse_ratio(ratio: &str, original: &str) -> Result<f64, FractionError> {
    let (n, d) = ratio
        .split_once('/')
        .ok_or_else(|| FractionError::Invalid(original.to_string()))?;
    let n = n
        .trim()
        .parse::<u64>()
        .map_err(|_| FractionError::Invalid(original.to_string()))?;
    let d = d
        .trim()
        .parse::<u64>()
        .map_err(|_| FractionError::Invalid(original.to_string()))?;
    if d == 0 {
        return Err(FractionError::ZeroDenominator(original.to_string()));
    }
    Ok(n as f64 / d as f64)
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}

/// A measurement carried both as a canonical decimal and its display fraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub decimal: f64,
    pub fraction: String,
}

impl Measure {
    /// Build from a decimal, rendering the fraction at the given denominator
    pub fn from_decimal(decimal: f64, denominator: u32) -> Self {
        Self {
            decimal,
            fraction: decimal_to_fraction_with(decimal, denominator),
        }
    }

    /// Parse fraction or decimal text, keeping the canonical rendering
    pub fn parse(text: &str, denominator: u32) -> Result<Self, FractionError> {
        fraction_to_decimal(text).map(|d| Self::from_decimal(d, denominator))
    }
}

impl std::fmt::Display for Measure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fraction)
    }
}
