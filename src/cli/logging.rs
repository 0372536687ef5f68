//! Logging setup
//!
//! Events go to stderr. The level comes from `-v` flags when given, then
//! `WQC_LOG` (any `EnvFilter` directive), then the configured `log_level`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding a filter directive
pub const LOG_ENV: &str = "WQC_LOG";

/// Level name for a `-v` count; `None` when no flag was given
pub fn verbosity_level(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info"),
        2 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Install the global subscriber; later calls are ignored
pub fn init_tracing(verbose: u8, configured_level: &str) {
    let filter = match verbosity_level(verbose) {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(configured_level)),
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
