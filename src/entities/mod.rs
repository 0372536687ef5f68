//! Entity type definitions

pub mod inspection;
pub mod lenient;

pub use inspection::{
    InspectionRecord, MeasurementDetails, MeasurementPoint, PieceRecord, PointResult, SizeRecord,
    SizeSummary, WashStage,
};
