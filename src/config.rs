//! Server configuration loaded from environment variables.

use crate::protocol::DEFAULT_MAX_LINE_BYTES;
use crate::session::domain::{Implementation, ServerCapabilities};
use crate::tool::domain::DEFAULT_TOOL_TIMEOUT;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Overrides `serverInfo.name`.
pub const SERVER_NAME_VAR: &str = "PARLEY_SERVER_NAME";
/// Overrides `serverInfo.version`.
pub const SERVER_VERSION_VAR: &str = "PARLEY_SERVER_VERSION";
/// Default tool timeout in whole seconds.
pub const TOOL_TIMEOUT_VAR: &str = "PARLEY_TOOL_TIMEOUT_SECS";
/// Inbound line limit in bytes.
pub const MAX_LINE_BYTES_VAR: &str = "PARLEY_MAX_LINE_BYTES";
/// Whether `resources.subscribe` is advertised.
pub const RESOURCE_SUBSCRIBE_VAR: &str = "PARLEY_RESOURCE_SUBSCRIBE";
/// Tracing filter used when `RUST_LOG` is unset.
pub const LOG_FILTER_VAR: &str = "PARLEY_LOG_FILTER";

/// Errors raised while reading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is not a positive integer.
    #[error("{variable} must be a positive integer, got '{value}'")]
    InvalidPositiveInteger {
        /// Variable name.
        variable: &'static str,
        /// Raw value.
        value: String,
    },
    /// A variable is not a boolean.
    #[error("{variable} must be 'true' or 'false', got '{value}'")]
    InvalidBoolean {
        /// Variable name.
        variable: &'static str,
        /// Raw value.
        value: String,
    },
    /// A variable is set but blank.
    #[error("{variable} must not be empty")]
    Empty {
        /// Variable name.
        variable: &'static str,
    },
}

/// Runtime settings for the server binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Identity reported in the `initialize` response.
    pub server_info: Implementation,
    /// Timeout applied to built-in tools.
    pub tool_timeout: Duration,
    /// Inbound line limit in bytes.
    pub max_line_bytes: usize,
    /// Whether clients may subscribe to resource updates.
    pub resource_subscribe: bool,
    /// Default tracing filter directive.
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_info: Implementation::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            tool_timeout: DEFAULT_TOOL_TIMEOUT,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            resource_subscribe: true,
            log_filter: "info".to_owned(),
        }
    }
}

impl ServerConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, falling back to defaults for
    /// unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let name = non_empty(SERVER_NAME_VAR, lookup(SERVER_NAME_VAR))?
            .unwrap_or(defaults.server_info.name);
        let version = non_empty(SERVER_VERSION_VAR, lookup(SERVER_VERSION_VAR))?
            .unwrap_or(defaults.server_info.version);
        let tool_timeout = lookup(TOOL_TIMEOUT_VAR)
            .map(|raw| positive_integer::<u64>(TOOL_TIMEOUT_VAR, &raw))
            .transpose()?
            .map_or(defaults.tool_timeout, Duration::from_secs);
        let max_line_bytes = lookup(MAX_LINE_BYTES_VAR)
            .map(|raw| positive_integer::<usize>(MAX_LINE_BYTES_VAR, &raw))
            .transpose()?
            .unwrap_or(defaults.max_line_bytes);
        let resource_subscribe = lookup(RESOURCE_SUBSCRIBE_VAR)
            .map(|raw| boolean(RESOURCE_SUBSCRIBE_VAR, &raw))
            .transpose()?
            .unwrap_or(defaults.resource_subscribe);
        let log_filter =
            non_empty(LOG_FILTER_VAR, lookup(LOG_FILTER_VAR))?.unwrap_or(defaults.log_filter);

        Ok(Self {
            server_info: Implementation::new(name, version),
            tool_timeout,
            max_line_bytes,
            resource_subscribe,
            log_filter,
        })
    }

    /// Returns the capabilities advertised by this configuration.
    #[must_use]
    pub const fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities::standard(self.resource_subscribe)
    }
}

fn non_empty(variable: &'static str, raw: Option<String>) -> Result<Option<String>, ConfigError> {
    match raw.map(|value| value.trim().to_owned()) {
        Some(value) if value.is_empty() => Err(ConfigError::Empty { variable }),
        other => Ok(other),
    }
}

fn positive_integer<T>(variable: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialOrd,
{
    raw.trim()
        .parse::<T>()
        .ok()
        .filter(|value| *value > T::default())
        .ok_or_else(|| ConfigError::InvalidPositiveInteger {
            variable,
            value: raw.to_owned(),
        })
}

fn boolean(variable: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBoolean {
            variable,
            value: raw.to_owned(),
        }),
    }
}
