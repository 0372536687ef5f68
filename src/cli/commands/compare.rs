//! `wqc compare` command - before/after wash comparison for a record

use console::style;
use miette::Result;

use crate::cli::helpers::{load_records, require_record};
use crate::cli::output::{effective_format, print_structured, requested_format};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::compare::{compare_with_counterparts, RecordComparison, NO_COMPARISON_DATA};
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct CompareArgs {
    /// Record id (either stage)
    pub id: String,

    /// Only this size
    #[arg(long)]
    pub size: Option<String>,

    /// Only rows whose value changed
    #[arg(long)]
    pub changed: bool,
}

const COMPARE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("size", "SIZE"),
    ColumnDef::new("point", "POINT"),
    ColumnDef::new("pc", "PC"),
    ColumnDef::new("before", "BEFORE"),
    ColumnDef::new("before-result", "B"),
    ColumnDef::new("after", "AFTER"),
    ColumnDef::new("after-result", "A"),
    ColumnDef::new("difference", "DIFF"),
    ColumnDef::new("change", "CHANGE"),
];

pub fn run(args: CompareArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let display = config.display_options();
    let records = load_records(global)?;
    let record = require_record(&records, &args.id)?;

    let mut comparison = compare_with_counterparts(record, &records, &display);
    if let Some(want) = args.size.as_deref() {
        comparison.sizes.retain(|s| s.size.trim() == want.trim());
    }
    if args.changed {
        for size in &mut comparison.sizes {
            for point in &mut size.points {
                point.pieces.retain(|p| p.difference.decimal().is_some_and(|d| d != 0.0));
            }
        }
    }

    let format = effective_format(requested_format(global, &config), true);
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&comparison, format),
        _ => {
            if format == OutputFormat::Table {
                print_heading(&comparison);
            }
            TableFormatter::new(COMPARE_COLUMNS, "row")
                .output(comparison_rows(&comparison), format)
        }
    }
}

fn print_heading(comparison: &RecordComparison) {
    let stage = comparison
        .stage
        .map(|s| s.to_string())
        .unwrap_or_else(|| "unknown stage".to_string());
    println!("{} ({})", style(&comparison.record).cyan(), stage);
    if comparison.counterparts.is_empty() {
        println!("  {}", style(NO_COMPARISON_DATA).yellow());
    } else {
        println!("  compared with: {}", comparison.counterparts.join(", "));
    }
    for size in comparison.sizes.iter().filter(|s| !s.is_available()) {
        println!(
            "  size {}: {}",
            size.size,
            size.message.as_deref().unwrap_or(NO_COMPARISON_DATA)
        );
    }
}

fn comparison_rows(comparison: &RecordComparison) -> Vec<TableRow> {
    comparison
        .sizes
        .iter()
        .filter(|s| s.is_available())
        .flat_map(|size| {
            size.points.iter().flat_map(move |point| {
                point.pieces.iter().map(move |pc| {
                    TableRow::new()
                        .cell("size", size.size.as_str())
                        .cell("point", point.point_name.as_str())
                        .cell("pc", pc.index)
                        .cell("before", pc.before_value.as_str())
                        .cell("before-result", CellValue::Pass(pc.before_pass))
                        .cell("after", pc.after_value.as_str())
                        .cell("after-result", CellValue::Pass(pc.after_pass))
                        .cell("difference", pc.difference_fraction.as_str())
                        .cell("change", pc.difference.sign())
                })
            })
        })
        .collect()
}
