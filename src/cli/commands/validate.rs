//! `wqc validate` command - check stored summaries and results against measurements

use console::style;
use miette::Result;

use crate::cli::helpers::load_records;
use crate::cli::GlobalOpts;
use crate::core::aggregate::{check_point_results, check_size_summaries};
use crate::entities::inspection::InspectionRecord;

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Record ids to validate (default: every record)
    #[arg()]
    pub ids: Vec<String>,

    /// Strict mode - warnings become errors
    #[arg(long)]
    pub strict: bool,

    /// Show summary only, don't show individual findings
    #[arg(long)]
    pub summary: bool,
}

/// Validation statistics
#[derive(Default)]
struct ValidationStats {
    records_checked: usize,
    records_passed: usize,
    records_failed: usize,
    total_errors: usize,
    total_warnings: usize,
}

#[derive(Debug, Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn inspect(record: &InspectionRecord) -> Findings {
    let mut findings = Findings::default();

    for v in check_size_summaries(record.size_summaries()).violations {
        findings.errors.push(format!(
            "size {}: {} pass + {} fail != {} checked points",
            v.size, v.total_pass, v.total_fail, v.checked_points
        ));
    }
    for m in check_point_results(record) {
        findings.warnings.push(format!(
            "size {} pc {} {}: stored {} but evaluates {} (deviation {:.4})",
            m.size, m.pc_number, m.point_name, m.stored, m.evaluated, m.deviation
        ));
    }
    if record.stage().is_none() {
        findings.warnings.push(format!(
            "unknown wash stage '{}'",
            record.before_after_wash
        ));
    }
    if !record.has_measurements() {
        findings.warnings.push("no measurements".to_string());
    }
    findings
}

pub fn run(args: ValidateArgs, global: &GlobalOpts) -> Result<()> {
    let records = load_records(global)?;
    let selected: Vec<&InspectionRecord> = if args.ids.is_empty() {
        records.iter().collect()
    } else {
        for id in &args.ids {
            if !records.iter().any(|r| r.id.as_deref() == Some(id.as_str())) {
                return Err(miette::miette!("No record with id '{}'", id));
            }
        }
        records
            .iter()
            .filter(|r| r.id.as_ref().is_some_and(|id| args.ids.contains(id)))
            .collect()
    };

    let mut stats = ValidationStats::default();
    println!(
        "{} Validating {} record(s)...\n",
        style("→").blue(),
        selected.len()
    );

    for record in selected {
        stats.records_checked += 1;
        let findings = inspect(record);
        stats.total_errors += findings.errors.len();
        stats.total_warnings += findings.warnings.len();

        let failed = !findings.errors.is_empty() || (args.strict && !findings.warnings.is_empty());
        if failed {
            stats.records_failed += 1;
        } else {
            stats.records_passed += 1;
        }

        if args.summary {
            continue;
        }
        let mark = if failed {
            style("✗").red()
        } else if findings.warnings.is_empty() {
            style("✓").green()
        } else {
            style("!").yellow()
        };
        println!("{} {}", mark, record.label());
        for e in &findings.errors {
            println!("    {} {}", style("error:").red(), e);
        }
        for w in &findings.warnings {
            println!("    {} {}", style("warning:").yellow(), w);
        }
    }

    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Validation Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("  Records checked: {}", style(stats.records_checked).cyan());
    println!("  Records passed:  {}", style(stats.records_passed).green());
    println!("  Records failed:  {}", style(stats.records_failed).red());
    println!("  Total errors:    {}", style(stats.total_errors).red());
    if stats.total_warnings > 0 {
        println!("  Total warnings:  {}", style(stats.total_warnings).yellow());
    }

    if stats.records_failed > 0 {
        return Err(miette::miette!(
            "Validation failed: {} record(s) with problems",
            stats.records_failed
        ));
    }
    println!("\n{} All records passed validation!", style("✓").green().bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_inspect_reports_bad_summary() {
        let record: InspectionRecord = serde_json::from_value(json!({
            "_id": "r1",
            "before_after_wash": "Before Wash",
            "measurementDetails": {
                "measurement": [{"size": "M", "pcs": [{"pcNumber": 1, "measurementPoints": [
                    {"pointName": "Chest", "specs": "20", "toleranceMinus": -0.25, "tolerancePlus": 0.25,
                     "measured_value_decimal": 20.5, "measured_value_fraction": "20 1/2", "result": "pass"}
                ]}]}],
                "measurementSizeSummary": [{"size": "M", "checkedPoints": 5, "totalPass": 3, "totalFail": 1}]
            }
        }))
        .unwrap();

        let findings = inspect(&record);
        assert_eq!(findings.errors.len(), 1);
        assert!(findings.errors[0].contains("3 pass + 1 fail != 5"));
        assert_eq!(findings.warnings.len(), 1);
        assert!(findings.warnings[0].contains("stored pass but evaluates fail"));
    }
}
