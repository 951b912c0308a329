//! Pluggable tool execution capability.

use super::{ExecutorError, ToolResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use tokio_util::sync::CancellationToken;

/// Produces a tool result from invocation arguments.
///
/// Implementations run on a dedicated worker task. The `cancellation` token
/// fires when the tool's timeout elapses or the caller gives up; executors
/// doing long-running work should select on it and return promptly.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Executes the tool.
    ///
    /// # Errors
    ///
    /// Returns an [`ExecutorError`] when the tool cannot produce a result.
    async fn execute(
        &self,
        input: Map<String, Value>,
        cancellation: CancellationToken,
    ) -> Result<ToolResult, ExecutorError>;
}

/// Adapts a synchronous closure into a [`ToolExecutor`].
///
/// # Examples
///
/// ```
/// use parley::tool::domain::{FnExecutor, ToolResult};
///
/// let executor = FnExecutor::new(|input| {
///     let message = input.get("message").and_then(|v| v.as_str()).unwrap_or_default();
///     Ok(ToolResult::text(message))
/// });
/// # let _ = executor;
/// ```
pub struct FnExecutor<F> {
    function: F,
}

impl<F> FnExecutor<F>
where
    F: Fn(&Map<String, Value>) -> Result<ToolResult, ExecutorError> + Send + Sync,
{
    /// Wraps `function`.
    #[must_use]
    pub const fn new(function: F) -> Self {
        Self { function }
    }
}

impl<F> fmt::Debug for FnExecutor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExecutor").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> ToolExecutor for FnExecutor<F>
where
    F: Fn(&Map<String, Value>) -> Result<ToolResult, ExecutorError> + Send + Sync,
{
    async fn execute(
        &self,
        input: Map<String, Value>,
        _cancellation: CancellationToken,
    ) -> Result<ToolResult, ExecutorError> {
        (self.function)(&input)
    }
}
