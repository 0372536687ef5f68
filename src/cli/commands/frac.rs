//! `wqc frac` command - decimal/fraction conversion

use miette::Result;
use serde::Serialize;

use crate::cli::output::{effective_format, requested_format};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::fraction::Measure;
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct FracArgs {
    /// Values to convert: decimals (`0.1875`) or fractions (`3/16`, `1 1/4`)
    #[arg(required = true, allow_hyphen_values = true)]
    pub values: Vec<String>,

    /// Fraction denominator (defaults to the configured value, 16)
    #[arg(long)]
    pub denominator: Option<u32>,
}

const FRAC_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("input", "INPUT"),
    ColumnDef::new("decimal", "DECIMAL"),
    ColumnDef::new("fraction", "FRACTION"),
];

#[derive(Debug, Serialize)]
struct Conversion {
    input: String,
    #[serde(flatten)]
    measure: Measure,
}

pub fn run(args: FracArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let denominator = args
        .denominator
        .filter(|d| *d > 0)
        .unwrap_or_else(|| config.fraction_denominator());

    let conversions = args
        .values
        .iter()
        .map(|input| {
            Measure::parse(input, denominator)
                .map(|measure| Conversion {
                    input: input.clone(),
                    measure,
                })
                .map_err(|e| miette::miette!("{}", e))
        })
        .collect::<Result<Vec<_>>>()?;

    let requested = requested_format(global, &config);
    let format = effective_format(requested, true);
    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            crate::cli::output::print_structured(&conversions, format)
        }
        OutputFormat::Tsv if conversions.len() == 1 && requested == OutputFormat::Auto => {
            // Bare conversion for scripting: `wqc frac 0.1875` -> 3/16
            let c = &conversions[0];
            if c.input.contains('/') {
                println!("{}", c.measure.decimal);
            } else {
                println!("{}", c.measure.fraction);
            }
            Ok(())
        }
        _ => {
            let rows = conversions
                .iter()
                .map(|c| {
                    TableRow::new()
                        .cell("input", c.input.as_str())
                        .cell("decimal", CellValue::Decimal(Some(c.measure.decimal)))
                        .cell("fraction", c.measure.fraction.as_str())
                })
                .collect();
            TableFormatter::new(FRAC_COLUMNS, "value")
                .without_summary()
                .output(rows, format)
        }
    }
}
