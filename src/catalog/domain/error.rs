//! Error types for catalog values, resource reads, and prompt rendering.

use crate::error::ErrorKind;
use std::sync::Arc;
use thiserror::Error;

/// Failure type returned by resource readers and prompt generators.
pub type ProviderError = Box<dyn std::error::Error + Send + Sync>;

/// Errors returned while constructing catalog values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The resource URI lacks a scheme or a scheme-specific part.
    #[error("resource URI '{0}' is invalid (expected '<scheme>:<path>')")]
    InvalidResourceUri(String),

    /// The resource display name is empty after trimming.
    #[error("resource name must not be empty")]
    EmptyResourceName,

    /// The prompt name is empty after trimming.
    #[error("prompt name must not be empty")]
    EmptyPromptName,

    /// The prompt name does not match the name pattern.
    #[error(
        "prompt name '{0}' is invalid (must start with a letter and contain only letters, digits, '_' or '-', at most 64 characters)"
    )]
    InvalidPromptName(String),

    /// A prompt argument name is empty after trimming.
    #[error("prompt argument name must not be empty")]
    EmptyArgumentName,
}

impl CatalogError {
    /// Returns the coarse error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Errors returned by [`super::Resource::read`].
#[derive(Debug, Clone, Error)]
pub enum ResourceReadError {
    /// The resource is registered without a reader.
    #[error("resource '{uri}' has no reader configured")]
    NoReader {
        /// Resource URI.
        uri: String,
    },

    /// The reader reported a failure.
    #[error("failed to read resource '{uri}': {cause}")]
    Failed {
        /// Resource URI.
        uri: String,
        /// Error reported by the reader.
        cause: Arc<dyn std::error::Error + Send + Sync>,
    },
}

/// Errors returned by [`super::Prompt::render`].
#[derive(Debug, Clone, Error)]
pub enum PromptGenerationError {
    /// A required argument was not supplied.
    #[error("prompt '{prompt}' requires argument '{argument}'")]
    MissingArgument {
        /// Prompt name.
        prompt: String,
        /// Missing argument name.
        argument: String,
    },

    /// The prompt is registered without a generator.
    #[error("prompt '{prompt}' has no generator configured")]
    NoGenerator {
        /// Prompt name.
        prompt: String,
    },

    /// The generator reported a failure.
    #[error("failed to render prompt '{prompt}': {cause}")]
    Failed {
        /// Prompt name.
        prompt: String,
        /// Error reported by the generator.
        cause: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl PromptGenerationError {
    /// Returns the coarse error category.
    ///
    /// Missing arguments are caller mistakes; generator failures are not
    /// classified and yield `None`.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::MissingArgument { .. } => Some(ErrorKind::Validation),
            Self::NoGenerator { .. } | Self::Failed { .. } => None,
        }
    }
}
