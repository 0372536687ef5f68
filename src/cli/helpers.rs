//! Shared helper functions for CLI commands

use std::path::Path;

use miette::Result;

use crate::cli::GlobalOpts;
use crate::core::store::{self, find_by_id};
use crate::core::wash::{NoRealWashQty, RealWashQtyLookup, RealWashQtyTable};
use crate::entities::inspection::InspectionRecord;

/// Data source from `--data` / `WQC_DATA`
pub fn data_path(global: &GlobalOpts) -> Result<&Path> {
    global.data.as_deref().ok_or_else(|| {
        miette::miette!(
            help = "pass --data <FILE|DIR> or set WQC_DATA",
            "No inspection records given"
        )
    })
}

/// Load every record from the data source
pub fn load_records(global: &GlobalOpts) -> Result<Vec<InspectionRecord>> {
    let path = data_path(global)?;
    store::load_records(path).map_err(|e| miette::miette!("{}", e))
}

/// Find a record by id or fail with a readable error
pub fn require_record<'a>(records: &'a [InspectionRecord], id: &str) -> Result<&'a InspectionRecord> {
    find_by_id(records, id).ok_or_else(|| {
        miette::miette!(
            help = "use `wqc list` to see record ids",
            "No record with id '{}'",
            id
        )
    })
}

/// Real-wash-quantity lookup from an optional table file
pub fn real_qty_lookup(path: Option<&Path>) -> Result<Box<dyn RealWashQtyLookup>> {
    match path {
        Some(p) => {
            let table = RealWashQtyTable::load(p).map_err(|e| miette::miette!("{}", e))?;
            tracing::debug!(rows = table.len(), "loaded real wash quantity table");
            Ok(Box::new(table))
        }
        None => Ok(Box::new(NoRealWashQty)),
    }
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// "-" for empty text
pub fn or_dash(s: &str) -> String {
    if s.trim().is_empty() {
        "-".to_string()
    } else {
        s.to_string()
    }
}
