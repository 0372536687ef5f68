//! `wqc tol` command - tolerance evaluation

use clap::Subcommand;
use miette::Result;
use serde::Serialize;

use crate::cli::output::{effective_format, print_structured, requested_format};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::fraction::{decimal_to_fraction_with, fraction_to_decimal};
use crate::core::tolerance::{evaluate, Verdict};
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum TolCommands {
    /// Check measured values against a spec and tolerance window
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Spec value (decimal or fraction)
    #[arg(long, short = 's', allow_hyphen_values = true)]
    pub spec: String,

    /// Minus tolerance; sign is ignored
    #[arg(long, short = 'm', allow_hyphen_values = true)]
    pub minus: String,

    /// Plus tolerance
    #[arg(long, short = 'p', allow_hyphen_values = true)]
    pub plus: String,

    /// Measured values (decimal or fraction)
    #[arg(required = true, allow_hyphen_values = true)]
    pub measured: Vec<String>,

    /// Exit with an error when any value fails
    #[arg(long)]
    pub strict: bool,
}

const CHECK_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("measured", "MEASURED"),
    ColumnDef::new("deviation", "DEVIATION"),
    ColumnDef::new("fraction", "FRACTION"),
    ColumnDef::new("result", "RESULT"),
    ColumnDef::new("side", "SIDE"),
];

#[derive(Debug, Serialize)]
struct CheckRow {
    measured: f64,
    fraction: String,
    #[serde(flatten)]
    verdict: Verdict,
}

pub fn run(cmd: TolCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        TolCommands::Check(args) => run_check(args, global),
    }
}

fn parse(label: &str, text: &str) -> Result<f64> {
    fraction_to_decimal(text).map_err(|e| miette::miette!("Invalid {}: {}", label, e))
}

fn run_check(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let denominator = config.fraction_denominator();
    let spec = parse("spec", &args.spec)?;
    let minus = parse("minus tolerance", &args.minus)?;
    let plus = parse("plus tolerance", &args.plus)?;

    let rows = args
        .measured
        .iter()
        .map(|m| {
            let measured = parse("measured value", m)?;
            let verdict = evaluate(spec, minus, plus, measured);
            Ok(CheckRow {
                measured,
                fraction: signed_fraction(verdict.deviation(), denominator),
                verdict,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let failed = rows.iter().filter(|r| !r.verdict.is_pass()).count();

    let format = effective_format(requested_format(global, &config), true);
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&rows, format)?,
        _ => {
            let table_rows = rows
                .iter()
                .map(|r| {
                    TableRow::new()
                        .cell("measured", CellValue::Decimal(Some(r.measured)))
                        .cell("deviation", CellValue::Decimal(Some(r.verdict.deviation())))
                        .cell("fraction", r.fraction.as_str())
                        .cell("result", CellValue::Pass(Some(r.verdict.is_pass())))
                        .cell(
                            "side",
                            r.verdict
                                .failed_side()
                                .map(|s| s.to_string())
                                .unwrap_or_else(|| "-".to_string()),
                        )
                })
                .collect();
            TableFormatter::new(CHECK_COLUMNS, "value")
                .without_summary()
                .output(table_rows, format)?;
        }
    }

    if args.strict && failed > 0 {
        return Err(miette::miette!("{} of {} value(s) out of tolerance", failed, rows.len()));
    }
    Ok(())
}

/// `+1/8`, `-1/16`, `0`
fn signed_fraction(value: f64, denominator: u32) -> String {
    let rendered = decimal_to_fraction_with(value, denominator);
    if value > 0.0 && rendered != "0" {
        format!("+{}", rendered)
    } else {
        rendered
    }
}
