//! `wqc summary` command - per-size summaries for one record
//!
//! Summaries are derived from the measurements. With `--stored` the
//! summaries saved on the record are shown instead, together with any
//! size whose pass and fail counts do not add up to its checked points.

use miette::Result;
use serde::Serialize;

use crate::cli::helpers::{load_records, require_record};
use crate::cli::output::{effective_format, print_structured, requested_format};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::aggregate::{
    check_size_summaries, expand_to_checked_qty, record_totals, summarize_size, RecordTotals,
    SummaryCheck,
};
use crate::core::Config;
use crate::entities::inspection::SizeSummary;

#[derive(clap::Args, Debug)]
pub struct SummaryArgs {
    /// Record id
    pub id: String,

    /// Show the summaries stored on the record
    #[arg(long)]
    pub stored: bool,

    /// Count duplicated pieces up to the checked quantity
    #[arg(long)]
    pub all_pcs: bool,
}

const SUMMARY_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("size", "SIZE"),
    ColumnDef::new("checked-pcs", "PCS"),
    ColumnDef::new("checked-points", "POINTS"),
    ColumnDef::new("pass", "PASS"),
    ColumnDef::new("fail", "FAIL"),
    ColumnDef::new("plus-fail", "+TOL FAIL"),
    ColumnDef::new("minus-fail", "-TOL FAIL"),
    ColumnDef::new("pass-rate", "PASS RATE"),
];

#[derive(Debug, Serialize)]
struct DerivedSummary {
    sizes: Vec<SizeSummary>,
    totals: RecordTotals,
}

pub fn run(args: SummaryArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let records = load_records(global)?;
    let record = require_record(&records, &args.id)?;
    let format = effective_format(requested_format(global, &config), true);

    if args.stored {
        let check = check_size_summaries(record.size_summaries());
        return output_stored(record.size_summaries(), &check, format);
    }

    let shown = if args.all_pcs {
        expand_to_checked_qty(record)
    } else {
        record.clone()
    };
    let derived = DerivedSummary {
        sizes: shown.sizes().iter().map(summarize_size).collect(),
        totals: record_totals(&shown),
    };

    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&derived, format),
        _ => {
            let rows = derived.sizes.iter().map(summary_row).collect();
            TableFormatter::new(SUMMARY_COLUMNS, "size").output(rows, format)?;
            if format == OutputFormat::Table {
                println!(
                    "Overall: {}/{} points pass ({:.2}%)",
                    derived.totals.total_pass, derived.totals.checked_points, derived.totals.pass_rate
                );
            }
            Ok(())
        }
    }
}

fn output_stored(summaries: &[SizeSummary], check: &SummaryCheck, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            #[derive(Serialize)]
            struct Stored<'a> {
                sizes: &'a [SizeSummary],
                #[serde(flatten)]
                check: &'a SummaryCheck,
            }
            print_structured(&Stored { sizes: summaries, check }, format)
        }
        _ => {
            let rows = summaries.iter().map(summary_row).collect();
            TableFormatter::new(SUMMARY_COLUMNS, "size").output(rows, format)?;
            for v in &check.violations {
                eprintln!(
                    "{} size {}: {} pass + {} fail != {} checked points",
                    console::style("warning:").yellow(),
                    v.size,
                    v.total_pass,
                    v.total_fail,
                    v.checked_points
                );
            }
            Ok(())
        }
    }
}

fn summary_row(s: &SizeSummary) -> TableRow {
    let rate = (s.checked_points > 0)
        .then(|| s.total_pass as f64 / s.checked_points as f64 * 100.0);
    TableRow::new()
        .cell("size", s.size.as_str())
        .cell("checked-pcs", s.checked_pcs)
        .cell("checked-points", s.checked_points)
        .cell("pass", s.total_pass)
        .cell("fail", s.total_fail)
        .cell("plus-fail", s.plus_tolerance_fail_count)
        .cell("minus-fail", s.minus_tolerance_fail_count)
        .cell("pass-rate", CellValue::Percent(rate))
}
