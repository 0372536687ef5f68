//! Filter enums shared by CLI commands

use clap::ValueEnum;

use crate::core::wash::WashQtyView;
use crate::entities::inspection::WashStage;

/// Wash stage filter for list commands
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum StageFilter {
    /// Before Wash records only
    Before,
    /// After Wash records only
    After,
    /// Both stages - default
    #[default]
    All,
}

impl StageFilter {
    pub fn stage(&self) -> Option<WashStage> {
        match self {
            StageFilter::Before => Some(WashStage::BeforeWash),
            StageFilter::After => Some(WashStage::AfterWash),
            StageFilter::All => None,
        }
    }
}

impl std::fmt::Display for StageFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageFilter::Before => write!(f, "before"),
            StageFilter::After => write!(f, "after"),
            StageFilter::All => write!(f, "all"),
        }
    }
}

/// Which wash quantity to show
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum ViewFilter {
    /// Quantity as captured at inspection - default
    #[default]
    Estimated,
    /// Actual, edited or real-wash-table quantity where available
    Actual,
}

impl From<ViewFilter> for WashQtyView {
    fn from(v: ViewFilter) -> Self {
        match v {
            ViewFilter::Estimated => WashQtyView::Estimated,
            ViewFilter::Actual => WashQtyView::Actual,
        }
    }
}

/// Point result filter for observation listings
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum ResultFilter {
    Pass,
    Fail,
    #[default]
    All,
}

impl ResultFilter {
    pub fn matches(&self, pass: bool) -> bool {
        match self {
            ResultFilter::Pass => pass,
            ResultFilter::Fail => !pass,
            ResultFilter::All => true,
        }
    }
}
