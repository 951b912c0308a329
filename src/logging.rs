//! Structured logging setup.
//!
//! Logs go to stderr so stdout stays reserved for protocol frames.

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter '{filter}': {source}")]
    InvalidFilter {
        /// Offending directive.
        filter: String,
        /// Parser error.
        #[source]
        source: ParseError,
    },
    /// Another global subscriber is already installed.
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Builds the filter from `rust_log`, falling back to `default_filter`.
///
/// # Errors
///
/// Returns [`LoggingError::InvalidFilter`] when the chosen directive does
/// not parse.
pub fn build_filter(
    rust_log: Option<&str>,
    default_filter: &str,
) -> Result<EnvFilter, LoggingError> {
    let directive = rust_log
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default_filter);
    EnvFilter::try_new(directive).map_err(|source| LoggingError::InvalidFilter {
        filter: directive.to_owned(),
        source,
    })
}

/// Installs a compact `fmt` subscriber writing to stderr.
///
/// The filter comes from `RUST_LOG` when set, otherwise `default_filter`.
///
/// # Errors
///
/// Returns [`LoggingError`] when the filter is invalid or a subscriber is
/// already installed.
pub fn init_logging(default_filter: &str) -> Result<(), LoggingError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(rust_log.as_deref(), default_filter)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, "info", "info")]
    #[case(Some(""), "info", "info")]
    #[case(Some("parley=debug"), "info", "parley=debug")]
    fn filter_prefers_rust_log(
        #[case] rust_log: Option<&str>,
        #[case] default_filter: &str,
        #[case] expected: &str,
    ) {
        let filter = build_filter(rust_log, default_filter).expect("valid filter");

        assert_eq!(filter.to_string(), expected);
    }

    #[rstest]
    fn invalid_directive_is_reported() {
        let err = build_filter(Some("parley=shouting"), "info").expect_err("invalid level");

        assert!(matches!(
            err,
            LoggingError::InvalidFilter { ref filter, .. } if filter == "parley=shouting"
        ));
    }
}
