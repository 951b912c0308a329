//! Error types for tool validation and execution.

use crate::error::ErrorKind;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors returned while constructing tool values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolDomainError {
    /// The tool name is empty after trimming.
    #[error("tool name must not be empty")]
    EmptyToolName,

    /// The tool name does not match `[A-Za-z][A-Za-z0-9_-]{0,63}`.
    #[error(
        "tool name '{0}' is invalid (must start with a letter and contain only letters, digits, '_' or '-', at most 64 characters)"
    )]
    InvalidToolName(String),

    /// The tool description is empty after trimming.
    #[error("tool description must not be empty")]
    EmptyToolDescription,

    /// The input schema is not a JSON object.
    #[error("tool input schema must be a JSON object")]
    InvalidInputSchema,

    /// A zero timeout would expire every invocation immediately.
    #[error("tool timeout must be greater than zero")]
    ZeroTimeout,
}

impl ToolDomainError {
    /// Returns the coarse error category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

/// Failure type returned by tool executors.
pub type ExecutorError = Box<dyn std::error::Error + Send + Sync>;

/// The distinguishable failure outcomes of a tool invocation.
///
/// A missing executor is deliberately absent here: it produces an
/// error-flagged [`super::ToolResult`] instead of an error.
#[derive(Debug, Clone, Error)]
pub enum ToolExecutionError {
    /// The executor ran and reported a failure.
    #[error("tool '{tool}' failed: {cause}")]
    Executor {
        /// Tool name.
        tool: String,
        /// Error reported by the executor.
        cause: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// The tool's own timeout elapsed before the executor finished.
    #[error("tool '{tool}' timed out after {}ms", timeout.as_millis())]
    DeadlineExceeded {
        /// Tool name.
        tool: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The caller cancelled the invocation.
    #[error("tool '{tool}' was cancelled")]
    Cancelled {
        /// Tool name.
        tool: String,
    },

    /// The executor panicked.
    #[error("tool '{tool}' panicked during execution")]
    Panicked {
        /// Tool name.
        tool: String,
    },
}

impl ToolExecutionError {
    /// Returns `true` when the failure was caused by the tool timeout.
    #[must_use]
    pub const fn is_deadline_exceeded(&self) -> bool {
        matches!(self, Self::DeadlineExceeded { .. })
    }
}
