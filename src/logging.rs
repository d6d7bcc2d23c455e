//! Logging setup.
//!
//! The host reads the handshake from stdout, so every log line goes to
//! **stderr**. Filtering follows `RUST_LOG`, e.g.
//!
//! ```bash
//! RUST_LOG=checkly_provider=debug terraform-provider-checkly
//! RUST_LOG=warn,checkly_provider::client=debug terraform-provider-checkly
//! ```

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn install(default_level: &str) -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(filter(default_level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
}

/// Install the stderr subscriber, filtering at `info` unless `RUST_LOG`
/// says otherwise.
///
/// A subscriber installed earlier stays in place.
pub fn init_logging() {
    init_logging_with_default(DEFAULT_FILTER);
}

/// Like [`init_logging`] with another default filter, e.g. `"debug"`.
pub fn init_logging_with_default(default_level: &str) {
    if let Err(err) = install(default_level) {
        eprintln!("logging not initialized: {}", err);
    }
}

/// Install the subscriber, returning false when one is already set.
pub fn try_init_logging() -> bool {
    install(DEFAULT_FILTER).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_parse() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
        assert!(EnvFilter::try_new("checkly_provider=debug").is_ok());
        assert!(EnvFilter::try_new("warn,checkly_provider::client=trace").is_ok());
    }

    #[test]
    fn test_second_init_is_harmless() {
        // Only one global subscriber per process; the loser reports false.
        try_init_logging();
        assert!(!try_init_logging());
        init_logging();
    }
}
