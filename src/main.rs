use clap::Parser;
use miette::Result;
use washqc::cli::{logging, Cli};
use washqc::core::Config;

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();

    if cli.global.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let config = Config::load();
    logging::init_tracing(cli.global.verbose, &config.log_level());

    washqc::cli::run(cli)
}
