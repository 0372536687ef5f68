//! `wqc edit-qty` command - record an edited actual wash quantity

use chrono::Utc;
use console::style;
use miette::Result;

use crate::cli::helpers::data_path;
use crate::cli::GlobalOpts;
use crate::core::store::RecordFile;

#[derive(clap::Args, Debug)]
pub struct EditQtyArgs {
    /// Record id
    pub id: String,

    /// New actual wash quantity (non-negative whole number)
    pub qty: String,
}

pub fn run(args: EditQtyArgs, global: &GlobalOpts) -> Result<()> {
    let path = data_path(global)?;
    if path.is_dir() {
        return Err(miette::miette!(
            help = "pass the export file that holds the record",
            "edit-qty needs --data to name a single JSON file, not a directory"
        ));
    }

    let mut file = RecordFile::open(path).map_err(|e| miette::miette!("{}", e))?;
    let qty = file
        .amend_edited_wash_qty(&args.id, &args.qty, Utc::now())
        .map_err(|e| miette::miette!("{}", e))?;
    file.save().map_err(|e| miette::miette!("{}", e))?;

    println!(
        "{} Set edited wash quantity of {} to {}",
        style("✓").green(),
        style(&args.id).cyan(),
        style(qty).yellow()
    );
    Ok(())
}
