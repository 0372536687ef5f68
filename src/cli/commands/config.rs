//! `wqc config` command - show configuration

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::output::{print_structured, requested_format};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::LOCAL_CONFIG_FILE;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration with defaults filled in
    Show,

    /// Print the configuration file locations
    Path,
}

pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    match cmd {
        ConfigCommands::Show => {
            let format = match requested_format(global, &config) {
                OutputFormat::Json => OutputFormat::Json,
                _ => OutputFormat::Yaml,
            };
            print_structured(&config.effective(), format)
        }
        ConfigCommands::Path => {
            match Config::user_config_path() {
                Some(p) => {
                    let marker = if p.exists() { style("✓").green() } else { style("-").dim() };
                    println!("{} user:  {}", marker, p.display());
                }
                None => println!("{} user:  (no home directory)", style("-").dim()),
            }
            let local = std::path::Path::new(LOCAL_CONFIG_FILE);
            let marker = if local.exists() { style("✓").green() } else { style("-").dim() };
            println!("{} local: {}", marker, local.display());
            Ok(())
        }
    }
}
