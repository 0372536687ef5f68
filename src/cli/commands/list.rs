//! `wqc list` command - filtered record listing

use std::path::PathBuf;

use chrono::NaiveDate;
use miette::Result;
use serde::Serialize;

use crate::cli::filters::{StageFilter, ViewFilter};
use crate::cli::helpers::{load_records, or_dash, real_qty_lookup, truncate_str};
use crate::cli::output::{effective_format, print_structured, requested_format};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::ListFilter;
use crate::core::wash::{resolve_display_wash_qty, WashQtyResolution};
use crate::core::Config;
use crate::entities::inspection::InspectionRecord;

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Created on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Created on or before this date (inclusive)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Buyer contains (case-insensitive)
    #[arg(long, short = 'b')]
    pub buyer: Option<String>,

    /// Order number contains (case-insensitive)
    #[arg(long, short = 'o')]
    pub order: Option<String>,

    /// Color contains (case-insensitive)
    #[arg(long, short = 'c')]
    pub color: Option<String>,

    /// Inspector id (exact)
    #[arg(long)]
    pub qc_id: Option<String>,

    /// Wash stage
    #[arg(long, short = 's', default_value = "all")]
    pub stage: StageFilter,

    /// Report type (e.g. Inline, "First Output", SOP)
    #[arg(long, short = 'r')]
    pub report_type: Option<String>,

    /// Which wash quantity to show
    #[arg(long, default_value = "estimated")]
    pub view: ViewFilter,

    /// Real wash quantity table (JSON) used by the actual view
    #[arg(long)]
    pub real_qty: Option<PathBuf>,

    /// Maximum number of records (defaults to the configured limit)
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only the count
    #[arg(long)]
    pub count: bool,
}

const LIST_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID"),
    ColumnDef::new("order", "ORDER"),
    ColumnDef::new("color", "COLOR"),
    ColumnDef::new("stage", "STAGE"),
    ColumnDef::new("report", "REPORT"),
    ColumnDef::new("wash-qty", "WASH QTY"),
    ColumnDef::new("source", "SOURCE"),
    ColumnDef::new("checked", "CHECKED"),
    ColumnDef::new("pass-rate", "PASS RATE"),
    ColumnDef::new("result", "RESULT"),
    ColumnDef::new("created", "CREATED"),
];

#[derive(Debug, Serialize)]
struct ListEntry<'a> {
    #[serde(flatten)]
    record: &'a InspectionRecord,
    #[serde(rename = "washQtyResolution")]
    wash_qty: WashQtyResolution,
}

pub fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let records = load_records(global)?;
    let lookup = real_qty_lookup(args.real_qty.as_deref())?;

    let filter = ListFilter {
        start_date: args.from,
        end_date: args.to,
        buyer: args.buyer,
        order_no: args.order,
        color: args.color,
        qc_id: args.qc_id,
        stage: args.stage.stage(),
        report_type: args.report_type,
        limit: Some(args.limit.unwrap_or_else(|| config.list_limit())),
    };
    let matched = filter.apply(&records);

    if args.count {
        println!("{}", matched.len());
        return Ok(());
    }

    let entries: Vec<ListEntry> = matched
        .into_iter()
        .map(|record| ListEntry {
            record,
            wash_qty: resolve_display_wash_qty(record, args.view.into(), lookup.as_ref()),
        })
        .collect();

    let format = effective_format(requested_format(global, &config), true);
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&entries, format),
        _ => {
            let rows = entries.iter().map(entry_to_row).collect();
            TableFormatter::new(LIST_COLUMNS, "record").output(rows, format)
        }
    }
}

fn entry_to_row(entry: &ListEntry) -> TableRow {
    let r = entry.record;
    let result = r
        .overall_final_result
        .as_deref()
        .map(|s| CellValue::Pass(Some(s.trim().eq_ignore_ascii_case("pass"))))
        .unwrap_or(CellValue::Pass(None));

    TableRow::new()
        .cell("id", r.id.clone().unwrap_or_else(|| "-".to_string()))
        .cell("order", or_dash(&r.order_no))
        .cell("color", truncate_str(&or_dash(&r.color), 24))
        .cell("stage", or_dash(&r.before_after_wash))
        .cell("report", or_dash(&r.report_type))
        .cell("wash-qty", entry.wash_qty.display_wash_qty)
        .cell("source", entry.wash_qty.source.to_string())
        .cell("checked", CellValue::Int(entry.wash_qty.display_checked_qty))
        .cell("pass-rate", CellValue::Percent(r.pass_rate))
        .cell("result", result)
        .cell("created", CellValue::Date(r.created_at))
}
