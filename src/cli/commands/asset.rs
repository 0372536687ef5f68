//! `wqc asset` command - image reference resolution and validation

use clap::Subcommand;
use miette::Result;
use serde::Serialize;

use crate::cli::output::{effective_format, print_structured, requested_format};
use crate::cli::table::{ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::assets::{embed_image, load_image, resolve_image_url, EmbeddedImage};
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum AssetCommands {
    /// Resolve image references to absolute URLs
    Resolve(ResolveArgs),

    /// Check image files or data URIs and report what the report would embed
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
pub struct ResolveArgs {
    /// Image references as stored on records
    #[arg(required = true)]
    pub refs: Vec<String>,

    /// Base URL (defaults to the configured api_base_url)
    #[arg(long)]
    pub base: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Image files or data URIs
    #[arg(required = true)]
    pub sources: Vec<String>,
}

const RESOLVE_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("reference", "REFERENCE"),
    ColumnDef::new("resolved", "RESOLVED"),
];

const CHECK_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("source", "SOURCE"),
    ColumnDef::new("kind", "KIND"),
    ColumnDef::new("format", "FORMAT"),
    ColumnDef::new("repaired", "REPAIRED"),
    ColumnDef::new("detail", "DETAIL"),
];

#[derive(Debug, Serialize)]
struct Resolved {
    reference: String,
    resolved: Option<String>,
}

#[derive(Debug, Serialize)]
struct Checked {
    source: String,
    #[serde(flatten)]
    image: EmbeddedImage,
}

pub fn run(cmd: AssetCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        AssetCommands::Resolve(args) => run_resolve(args, global),
        AssetCommands::Check(args) => run_check(args, global),
    }
}

fn run_resolve(args: ResolveArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let base = args.base.unwrap_or_else(|| config.api_base_url());
    let resolved: Vec<Resolved> = args
        .refs
        .into_iter()
        .map(|reference| Resolved {
            resolved: resolve_image_url(&reference, &base),
            reference,
        })
        .collect();

    let format = effective_format(requested_format(global, &config), true);
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&resolved, format),
        _ => {
            let rows = resolved
                .iter()
                .map(|r| {
                    TableRow::new()
                        .cell("reference", r.reference.as_str())
                        .cell("resolved", r.resolved.clone().unwrap_or_else(|| "-".to_string()))
                })
                .collect();
            TableFormatter::new(RESOLVE_COLUMNS, "reference")
                .without_summary()
                .output(rows, format)
        }
    }
}

fn run_check(args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let limit = config.jpeg_scan_limit();
    let checked: Vec<Checked> = args
        .sources
        .into_iter()
        .map(|source| {
            let image = match load_image(&source) {
                Ok(bytes) => embed_image(&bytes, limit),
                Err(e) => {
                    tracing::warn!(source = %source, error = %e, "could not load image");
                    EmbeddedImage::Placeholder {
                        reason: e.to_string(),
                    }
                }
            };
            Checked { source, image }
        })
        .collect();

    let format = effective_format(requested_format(global, &config), true);
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&checked, format),
        _ => {
            let rows = checked.iter().map(check_row).collect();
            TableFormatter::new(CHECK_COLUMNS, "image").output(rows, format)
        }
    }
}

fn check_row(c: &Checked) -> TableRow {
    let source = if c.source.starts_with("data:") {
        "data URI".to_string()
    } else {
        c.source.clone()
    };
    let row = TableRow::new().cell("source", source);
    match &c.image {
        EmbeddedImage::Image {
            format,
            repaired,
            bytes,
            ..
        } => row
            .cell("kind", "image")
            .cell("format", format.mime())
            .cell("repaired", if *repaired { "yes" } else { "no" })
            .cell("detail", format!("{} bytes", bytes)),
        EmbeddedImage::Placeholder { reason } => row
            .cell("kind", "placeholder")
            .cell("format", "-")
            .cell("repaired", "-")
            .cell("detail", reason.as_str()),
    }
}
