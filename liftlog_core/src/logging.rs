//! Tracing setup shared by the `liftlog` binary and the core unit tests.
//!
//! Command output (tables, `--json` documents, CSV paths) owns stdout, so
//! every log line goes to stderr. The default filter only lets warnings
//! through: skipped set-log lines and library fallbacks are reported,
//! per-exercise progression decisions stay silent unless `RUST_LOG` asks
//! for them.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_LEVEL: &str = "warn";

/// Install the stderr subscriber with [`DEFAULT_LEVEL`]
pub fn init() {
    init_with_level(DEFAULT_LEVEL)
}

/// Install the stderr subscriber, falling back to `default_level` when
/// `RUST_LOG` is unset or unparsable
///
/// A second call is a no-op; the first subscriber stays installed.
pub fn init_with_level(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}

/// Route debug output through the libtest capture so progression
/// decisions show up next to a failing assertion
#[cfg(test)]
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::new("debug"))
        .try_init();
}
