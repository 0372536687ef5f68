//! `wqc points` command - per-point observations for one record

use miette::Result;
use serde::Serialize;

use crate::cli::filters::ResultFilter;
use crate::cli::helpers::{load_records, require_record};
use crate::cli::output::{effective_format, print_structured, requested_format};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::aggregate::{
    expand_to_checked_qty, measurement_point_summary, point_observations, sizes_for_kvalue,
    PointObservations,
};
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct PointsArgs {
    /// Record id
    pub id: String,

    /// Only this size
    #[arg(long)]
    pub size: Option<String>,

    /// Only sizes with this K-value
    #[arg(long, short = 'k')]
    pub kvalue: Option<String>,

    /// Only this point name (case-insensitive)
    #[arg(long, short = 'p')]
    pub point: Option<String>,

    /// Filter observations by result
    #[arg(long, default_value = "all")]
    pub result: ResultFilter,

    /// Duplicate measured pieces up to the checked quantity
    #[arg(long)]
    pub all_pcs: bool,

    /// Show pass/fail counts per distinct value instead of each piece
    #[arg(long, conflicts_with = "summary")]
    pub groups: bool,

    /// Merge every size into one summary per point name
    #[arg(long)]
    pub summary: bool,
}

const POINT_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("size", "SIZE"),
    ColumnDef::new("point", "POINT"),
    ColumnDef::new("spec", "SPEC"),
    ColumnDef::new("tol-minus", "TOL-"),
    ColumnDef::new("tol-plus", "TOL+"),
    ColumnDef::new("pc", "PC"),
    ColumnDef::new("value", "VALUE"),
    ColumnDef::new("result", "RESULT"),
];

const GROUP_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("size", "SIZE"),
    ColumnDef::new("point", "POINT"),
    ColumnDef::new("value", "VALUE"),
    ColumnDef::new("pass", "PASS"),
    ColumnDef::new("fail", "FAIL"),
    ColumnDef::new("total", "TOTAL"),
];

const SUMMARY_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("point", "POINT"),
    ColumnDef::new("spec", "SPEC"),
    ColumnDef::new("size", "SIZE"),
    ColumnDef::new("kvalue", "K"),
    ColumnDef::new("pc", "PC"),
    ColumnDef::new("value", "VALUE"),
    ColumnDef::new("result", "RESULT"),
];

#[derive(Debug, Serialize)]
struct SizePoints {
    size: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kvalue: Option<String>,
    points: Vec<PointObservations>,
}

fn point_matches(filter: &Option<String>, name: &str) -> bool {
    filter
        .as_deref()
        .map_or(true, |p| p.trim().eq_ignore_ascii_case(name.trim()))
}

pub fn run(args: PointsArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let display = config.display_options();
    let records = load_records(global)?;
    let record = require_record(&records, &args.id)?;
    let shown = if args.all_pcs {
        expand_to_checked_qty(record)
    } else {
        record.clone()
    };
    let format = effective_format(requested_format(global, &config), true);

    if args.summary {
        let mut summary = measurement_point_summary(shown.sizes(), args.kvalue.as_deref(), &display);
        summary.retain(|name, _| point_matches(&args.point, name));
        for entry in summary.values_mut() {
            entry
                .measurements
                .retain(|m| args.result.matches(m.result.is_pass()));
        }
        return match format {
            OutputFormat::Json | OutputFormat::Yaml => print_structured(&summary, format),
            _ => {
                let rows = summary
                    .iter()
                    .flat_map(|(name, entry)| {
                        entry.measurements.iter().map(move |m| {
                            TableRow::new()
                                .cell("point", name.as_str())
                                .cell("spec", entry.specs.as_str())
                                .cell("size", m.size.as_str())
                                .cell("kvalue", m.kvalue.clone().unwrap_or_else(|| "-".to_string()))
                                .cell("pc", m.pc_number.as_str())
                                .cell("value", m.value.as_str())
                                .cell("result", CellValue::Pass(Some(m.result.is_pass())))
                        })
                    })
                    .collect();
                TableFormatter::new(SUMMARY_COLUMNS, "measurement").output(rows, format)
            }
        };
    }

    let sizes: Vec<SizePoints> = sizes_for_kvalue(shown.sizes(), args.kvalue.as_deref())
        .filter(|s| args.size.as_deref().map_or(true, |want| s.size.trim() == want.trim()))
        .map(|s| {
            let mut points = point_observations(s, &display);
            points.retain(|p| point_matches(&args.point, &p.point_name));
            for p in &mut points {
                p.observations.retain(|o| args.result.matches(o.result.is_pass()));
            }
            SizePoints {
                size: s.size.clone(),
                kvalue: s.kvalue.clone(),
                points,
            }
        })
        .collect();

    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&sizes, format),
        _ if args.groups => {
            let rows = sizes
                .iter()
                .flat_map(|s| {
                    s.points.iter().flat_map(move |p| {
                        p.groups.iter().map(move |g| {
                            TableRow::new()
                                .cell("size", s.size.as_str())
                                .cell("point", p.point_name.as_str())
                                .cell("value", g.value.as_str())
                                .cell("pass", g.pass)
                                .cell("fail", g.fail)
                                .cell("total", g.total())
                        })
                    })
                })
                .collect();
            TableFormatter::new(GROUP_COLUMNS, "value").output(rows, format)
        }
        _ => {
            let rows = sizes
                .iter()
                .flat_map(|s| {
                    s.points.iter().flat_map(move |p| {
                        p.observations.iter().map(move |o| {
                            let pc = if o.duplicated {
                                format!("{}*", o.pc_number)
                            } else {
                                o.pc_number.clone()
                            };
                            TableRow::new()
                                .cell("size", s.size.as_str())
                                .cell("point", p.point_name.as_str())
                                .cell("spec", p.specs.as_str())
                                .cell("tol-minus", p.tolerance_minus.as_str())
                                .cell("tol-plus", p.tolerance_plus.as_str())
                                .cell("pc", pc)
                                .cell("value", o.value.as_str())
                                .cell("result", CellValue::Pass(Some(o.result.is_pass())))
                        })
                    })
                })
                .collect();
            TableFormatter::new(POINT_COLUMNS, "observation").output(rows, format)
        }
    }
}
