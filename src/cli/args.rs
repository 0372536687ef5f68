//! Command-line argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    asset::AssetCommands, compare::CompareArgs, completions::CompletionsArgs,
    config::ConfigCommands, delete::DeleteArgs, edit_qty::EditQtyArgs, filters::FiltersArgs,
    frac::FracArgs, list::ListArgs, points::PointsArgs, progress::ProgressArgs,
    report::ReportArgs, summary::SummaryArgs, tol::TolCommands, validate::ValidateArgs,
};

#[derive(Parser, Debug)]
#[command(name = "wqc")]
#[command(author, version, about = "Garment QC-washing measurement toolkit")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long = "format", short = 'f', global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Exported inspection records (a JSON file or a directory of them)
    #[arg(long, short = 'd', global = true, env = "WQC_DATA")]
    pub data: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// TSV for lists, YAML for single items
    #[default]
    Auto,
    /// Bordered table
    Table,
    Json,
    Yaml,
    Csv,
    /// Tab-separated values
    Tsv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Auto => write!(f, "auto"),
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Tsv => write!(f, "tsv"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <OutputFormat as ValueEnum>::from_str(s, true)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert between decimal inches and fractions
    Frac(FracArgs),

    /// Tolerance evaluation
    #[command(subcommand)]
    Tol(TolCommands),

    /// List inspection records with filtering
    List(ListArgs),

    /// Show the values available to list filters
    Filters(FiltersArgs),

    /// Size summaries for a record
    Summary(SummaryArgs),

    /// Per-point measurement observations for a record
    Points(PointsArgs),

    /// Cumulative washed and remaining quantity for a record
    Progress(ProgressArgs),

    /// Compare a record with the other side of the wash
    Compare(CompareArgs),

    /// Build the full report document for a record
    Report(ReportArgs),

    /// Check stored summaries and results against the measurements
    Validate(ValidateArgs),

    /// Record an edited actual wash quantity
    EditQty(EditQtyArgs),

    /// Delete a record from an export file
    Delete(DeleteArgs),

    /// Image reference resolution and validation
    #[command(subcommand)]
    Asset(AssetCommands),

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}
