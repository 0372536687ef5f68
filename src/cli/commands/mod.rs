//! CLI command implementations

pub mod asset;
pub mod compare;
pub mod completions;
pub mod config;
pub mod delete;
pub mod edit_qty;
pub mod filters;
pub mod frac;
pub mod list;
pub mod points;
pub mod progress;
pub mod report;
pub mod summary;
pub mod tol;
pub mod validate;
