//! Core module - measurement, reconciliation and comparison logic

pub mod aggregate;
pub mod assets;
pub mod compare;
pub mod config;
pub mod fraction;
pub mod report;
pub mod store;
pub mod tolerance;
pub mod wash;

pub use config::Config;
pub use fraction::{decimal_to_fraction, fraction_to_decimal, FractionError, Measure};
pub use store::{ListFilter, RecordFile, StoreError};
pub use tolerance::{evaluate, tolerance_as_fraction, ToleranceSide, Verdict};
pub use wash::{compute_wash_progress, WashProgress};

/// Rendering knobs shared by aggregation and comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayOptions {
    /// Fraction denominator for tolerance and difference strings
    pub denominator: u32,
    /// Differences smaller than this render as no change
    pub no_change_threshold: f64,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            denominator: fraction::DEFAULT_DENOMINATOR,
            no_change_threshold: 0.001,
        }
    }
}
