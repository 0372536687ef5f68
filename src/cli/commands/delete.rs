//! `wqc delete` command - remove a record from an export file

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::data_path;
use crate::cli::GlobalOpts;
use crate::core::store::RecordFile;

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Record id
    pub id: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Show what would be done without making changes
    #[arg(long)]
    pub dry_run: bool,
}

pub fn run(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let path = data_path(global)?;
    if path.is_dir() {
        return Err(miette::miette!(
            help = "pass the export file that holds the record",
            "delete needs --data to name a single JSON file, not a directory"
        ));
    }

    let mut file = RecordFile::open(path).map_err(|e| miette::miette!("{}", e))?;
    let removed = file.delete(&args.id).map_err(|e| miette::miette!("{}", e))?;
    let order = removed.get("orderNo").and_then(|v| v.as_str()).unwrap_or("-");
    let color = removed.get("color").and_then(|v| v.as_str()).unwrap_or("-");

    if args.dry_run {
        println!(
            "Would delete {} ({} / {}) from {}",
            style(&args.id).cyan(),
            order,
            color,
            file.path().display()
        );
        println!("\nNo changes made (dry run).");
        return Ok(());
    }

    if !args.yes {
        print!("Delete {} ({} / {})? [y/N] ", args.id, order, color);
        std::io::Write::flush(&mut std::io::stdout()).into_diagnostic()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input).into_diagnostic()?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    file.save().map_err(|e| miette::miette!("{}", e))?;
    println!(
        "{} Deleted {} ({} record(s) left)",
        style("✓").green(),
        style(&args.id).cyan(),
        file.len()
    );
    Ok(())
}
