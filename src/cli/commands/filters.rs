//! `wqc filters` command - distinct values for list filters

use miette::Result;

use crate::cli::helpers::load_records;
use crate::cli::output::{effective_format, print_structured, requested_format};
use crate::cli::table::{ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::store::filter_options;
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct FiltersArgs {}

const FILTER_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("field", "FIELD"),
    ColumnDef::new("value", "VALUE"),
];

pub fn run(_args: FiltersArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let records = load_records(global)?;
    let options = filter_options(&records);

    let format = effective_format(requested_format(global, &config), true);
    match format {
        OutputFormat::Json | OutputFormat::Yaml => print_structured(&options, format),
        _ => {
            let groups: [(&'static str, &Vec<String>); 4] = [
                ("buyer", &options.buyers),
                ("order", &options.orders),
                ("color", &options.colors),
                ("qc-id", &options.qc_ids),
            ];
            let rows = groups
                .iter()
                .flat_map(|(field, values)| {
                    values
                        .iter()
                        .map(move |v| TableRow::new().cell("field", *field).cell("value", v.as_str()))
                })
                .collect();
            TableFormatter::new(FILTER_COLUMNS, "value").output(rows, format)
        }
    }
}
