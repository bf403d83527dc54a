//! Log subscriber setup
//!
//! `RUST_LOG` overrides the level picked from `-q` / `-v`. Logs always go to
//! stderr so stdout stays parseable.

use crate::config::CliConfig;
use tracing_subscriber::EnvFilter;

/// Filter from `RUST_LOG`, or `default` when unset or invalid
#[must_use]
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber; a second call is a no-op
pub fn init_logging(config: &CliConfig) {
    let filter = env_filter(config.verbosity.log_filter());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = if config.log_json {
        builder.json().try_init()
    } else {
        builder
            .with_ansi(config.color.should_color())
            .compact()
            .try_init()
    };
}
