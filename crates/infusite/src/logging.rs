//! Logging setup for infusite.
//!
//! Everything in the crate logs through `tracing`; this module installs the
//! subscriber for the binary.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Warnings and errors. Info lines would clutter command output.
    #[default]
    Normal,
    /// Debug and above.
    Verbose,
    /// Everything, including each suggestion pipeline step.
    Trace,
}

impl Verbosity {
    /// Convert verbosity to a tracing level.
    #[must_use]
    pub fn to_level_filter(&self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

/// Initialize the logging system.
///
/// Call once at startup. `RUST_LOG` takes precedence over `verbosity`.
/// Output goes to stderr so that JSON printed on stdout stays parseable.
///
/// # Examples
///
/// ```no_run
/// use infusite::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let default_filter = format!("infusite={}", verbosity.to_level_filter());

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_filter));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false),
    );

    // Ignore the error if a subscriber is already installed
    let _ = subscriber.try_init();
}

/// Initialize logging for tests.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
