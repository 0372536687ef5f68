//! CLI module - argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod filters;
pub mod helpers;
pub mod logging;
pub mod output;
pub mod table;

pub use args::{Cli, Commands, GlobalOpts, OutputFormat};
pub use filters::{ResultFilter, StageFilter, ViewFilter};

use miette::Result;

/// Run a parsed command line
pub fn run(cli: Cli) -> Result<()> {
    let global = cli.global;
    match cli.command {
        Commands::Frac(args) => commands::frac::run(args, &global),
        Commands::Tol(cmd) => commands::tol::run(cmd, &global),
        Commands::List(args) => commands::list::run(args, &global),
        Commands::Filters(args) => commands::filters::run(args, &global),
        Commands::Summary(args) => commands::summary::run(args, &global),
        Commands::Points(args) => commands::points::run(args, &global),
        Commands::Progress(args) => commands::progress::run(args, &global),
        Commands::Compare(args) => commands::compare::run(args, &global),
        Commands::Report(args) => commands::report::run(args, &global),
        Commands::Validate(args) => commands::validate::run(args, &global),
        Commands::EditQty(args) => commands::edit_qty::run(args, &global),
        Commands::Delete(args) => commands::delete::run(args, &global),
        Commands::Asset(cmd) => commands::asset::run(cmd, &global),
        Commands::Config(cmd) => commands::config::run(cmd, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
