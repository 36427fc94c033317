//! Tracing setup for the CLI.
//!
//! The library emits all of its diagnostics through `tracing`; nothing is
//! visible until the binary installs a subscriber here. Events go to stderr
//! so stdout stays clean for `--json` stats output.

use thumbsmith_core::config::LoggingConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber from the logging config.
///
/// Level precedence: `RUST_LOG` when set, then `--verbose`, then the
/// configured level. A configured level that does not parse as a filter
/// directive drops to `info` rather than failing the run. `--json-logs` or
/// `format = "json"` switches to line-delimited JSON events.
pub fn init(config: &LoggingConfig, verbose: bool, json_logs: bool) {
    let configured = if verbose {
        "debug"
    } else {
        config.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(configured).unwrap_or_else(|_| EnvFilter::new("info"))
    });

    let stderr = fmt::layer().with_writer(std::io::stderr);
    if json_logs || config.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(stderr.compact().with_target(false))
            .init();
    }
}
