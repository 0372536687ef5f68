//! `wqc report` command - assemble the report document for a record

use std::path::PathBuf;

use chrono::Utc;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::filters::ViewFilter;
use crate::cli::helpers::{load_records, real_qty_lookup, require_record};
use crate::cli::output::{effective_format, print_structured, requested_format};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::report::{build_report, QcReport, ReportOptions};
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct ReportArgs {
    /// Record id
    pub id: String,

    /// Which wash quantity to show
    #[arg(long, default_value = "estimated")]
    pub view: ViewFilter,

    /// Duplicate measured pieces up to the checked quantity
    #[arg(long)]
    pub all_pcs: bool,

    /// Real wash quantity table (JSON) used by the actual view
    #[arg(long)]
    pub real_qty: Option<PathBuf>,

    /// Write the report as JSON to this file
    #[arg(long, short = 'o', conflicts_with = "save")]
    pub output: Option<PathBuf>,

    /// Write the report as JSON under its report file name
    #[arg(long)]
    pub save: bool,
}

pub fn run(args: ReportArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let records = load_records(global)?;
    let record = require_record(&records, &args.id)?;
    let lookup = real_qty_lookup(args.real_qty.as_deref())?;

    let options = ReportOptions {
        view: args.view.into(),
        show_all_pcs: args.all_pcs,
        display: config.display_options(),
        match_window_secs: config.match_window_secs(),
        api_base_url: config.api_base_url(),
    };
    let report = build_report(record, &records, lookup.as_ref(), &options, Utc::now());

    let target = match (args.output, args.save) {
        (Some(path), _) => Some(path),
        (None, true) => Some(PathBuf::from(json_file_name(&report.file_name))),
        (None, false) => None,
    };
    if let Some(path) = target {
        let json = serde_json::to_string_pretty(&report).into_diagnostic()?;
        std::fs::write(&path, json + "\n").into_diagnostic()?;
        println!(
            "{} Wrote report for {} to {}",
            style("✓").green(),
            style(record.label()).cyan(),
            path.display()
        );
        return Ok(());
    }

    let format = effective_format(requested_format(global, &config), false);
    match format {
        OutputFormat::Table => {
            print_overview(&report);
            Ok(())
        }
        _ => print_structured(&report, format),
    }
}

/// `QC_Washing_Report_X_Y.pdf` -> `QC_Washing_Report_X_Y.json`
fn json_file_name(pdf_name: &str) -> String {
    match pdf_name.strip_suffix(".pdf") {
        Some(stem) => format!("{}.json", stem),
        None => format!("{}.json", pdf_name),
    }
}

fn print_overview(report: &QcReport) {
    let h = &report.header;
    println!("{}", style(&report.file_name).bold());
    println!("  Order:    {} / {}", h.order_no, h.color);
    println!("  Stage:    {} ({})", h.before_after_wash, h.report_type);
    println!(
        "  Wash qty: {} [{}]",
        report.wash_qty.display_wash_qty, report.wash_qty.source
    );
    println!(
        "  Progress: {} washed, {} remaining",
        report.progress.already_washed_qty, report.progress.remaining_qty
    );
    println!(
        "  Points:   {}/{} pass ({:.2}%)",
        report.totals.total_pass, report.totals.checked_points, report.totals.pass_rate
    );
    println!("  Sizes:    {}", report.sizes.len());
    println!("  Images:   {}", report.images.len());
    if !report.stored_summary_check.is_consistent() {
        println!(
            "  {} {} stored size summar(ies) do not add up",
            style("!").yellow(),
            report.stored_summary_check.violations.len()
        );
    }
    if !report.result_mismatches.is_empty() {
        println!(
            "  {} {} stored result(s) disagree with tolerance",
            style("!").yellow(),
            report.result_mismatches.len()
        );
    }
}
