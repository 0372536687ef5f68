//! `wqc progress` command - cumulative washed quantity for a record

use console::style;
use miette::Result;

use crate::cli::helpers::{load_records, require_record};
use crate::cli::output::{effective_format, print_structured, requested_format};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::wash::compute_wash_progress_with;
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct ProgressArgs {
    /// Record id
    pub id: String,

    /// Seconds within which a same-quantity record counts as the current one
    #[arg(long, value_parser = clap::value_parser!(i64).range(0..))]
    pub window: Option<i64>,
}

pub fn run(args: ProgressArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let records = load_records(global)?;
    let record = require_record(&records, &args.id)?;
    let window = args.window.unwrap_or_else(|| config.match_window_secs());
    let progress = compute_wash_progress_with(record, &records, window);

    let format = effective_format(requested_format(global, &config), false);
    match format {
        OutputFormat::Table => {
            println!("{}", style(record.label()).cyan());
            println!(
                "  Washed so far: {}",
                style(progress.already_washed_qty).green()
            );
            println!("  Remaining:     {}", progress.remaining_qty);
            println!(
                "  Record {} of {} ({})",
                progress.current_record_position, progress.total_records, progress.resolution
            );
            Ok(())
        }
        _ => print_structured(&progress, format),
    }
}
