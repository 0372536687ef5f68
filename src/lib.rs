//! washqc: garment QC-washing measurement toolkit
//!
//! Tolerance evaluation, measurement aggregation, wash quantity
//! reconciliation and before/after-wash comparison over inspection records
//! exported from the QC-washing read API.

pub mod cli;
pub mod core;
pub mod entities;
pub mod yaml;
