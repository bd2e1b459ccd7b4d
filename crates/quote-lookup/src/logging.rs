//! Tracing subscriber setup for binaries embedding the lookup service.

use quote_core::{QuoteError, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a global fmt subscriber filtered by `level`.
///
/// `level` is an `EnvFilter` directive such as `error` or
/// `quote_lookup=debug,warn`. Output goes to stderr.
///
/// # Errors
///
/// Returns [`QuoteError::Misconfigured`] if the directive does not parse or a
/// global subscriber is already installed.
pub fn init(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .map_err(|e| QuoteError::Misconfigured(format!("log level {level:?}: {e}")))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .map_err(|e| QuoteError::Misconfigured(e.to_string()))
}
