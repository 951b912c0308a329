//! Tool entity and its bounded execution.

use super::{
    HANDLER_NOT_CONFIGURED, ToolDomainError, ToolExecutionError, ToolExecutor, ToolName,
    ToolResult,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Timeout applied when a tool does not configure its own.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Advisory call budget attached to a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Maximum number of calls within `window`.
    pub max_calls: u32,
    /// Length of the accounting window.
    pub window: Duration,
}

/// Wire shape of a tool as listed to protocol clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    /// Tool name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON schema describing accepted arguments.
    pub input_schema: Value,
}

/// An invocable capability.
///
/// Tools are cheap to clone: the executor is shared behind an [`Arc`]. A
/// session registry and a conversation tool list each hold their own copy.
#[derive(Clone)]
pub struct Tool {
    name: ToolName,
    description: String,
    input_schema: Value,
    executor: Option<Arc<dyn ToolExecutor>>,
    category: Option<String>,
    tags: Vec<String>,
    enabled: bool,
    rate_limit: Option<RateLimit>,
    timeout: Duration,
    metadata: HashMap<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Tool {
    /// Creates an enabled tool without an executor.
    ///
    /// # Errors
    ///
    /// Returns [`ToolDomainError::EmptyToolDescription`] when the description
    /// is blank or [`ToolDomainError::InvalidInputSchema`] when the schema is
    /// not a JSON object.
    pub fn new(
        name: ToolName,
        description: impl Into<String>,
        input_schema: Value,
        clock: &impl Clock,
    ) -> Result<Self, ToolDomainError> {
        let normalized_description = description.into().trim().to_owned();
        if normalized_description.is_empty() {
            return Err(ToolDomainError::EmptyToolDescription);
        }

        if !input_schema.is_object() {
            return Err(ToolDomainError::InvalidInputSchema);
        }

        let timestamp = clock.utc();
        Ok(Self {
            name,
            description: normalized_description,
            input_schema,
            executor: None,
            category: None,
            tags: Vec::new(),
            enabled: true,
            rate_limit: None,
            timeout: DEFAULT_TOOL_TIMEOUT,
            metadata: HashMap::new(),
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Attaches the executor invoked by [`Tool::execute`].
    #[must_use]
    pub fn with_executor(mut self, executor: Arc<dyn ToolExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    /// Sets the category used for repository filtering.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Replaces the tag list.
    #[must_use]
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the advisory rate limit.
    #[must_use]
    pub const fn with_rate_limit(mut self, rate_limit: RateLimit) -> Self {
        self.rate_limit = Some(rate_limit);
        self
    }

    /// Overrides the execution timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ToolDomainError::ZeroTimeout`] for a zero duration.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, ToolDomainError> {
        if timeout.is_zero() {
            return Err(ToolDomainError::ZeroTimeout);
        }
        self.timeout = timeout;
        Ok(self)
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Returns the tool name.
    #[must_use]
    pub const fn name(&self) -> &ToolName {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the input schema.
    #[must_use]
    pub const fn input_schema(&self) -> &Value {
        &self.input_schema
    }

    /// Returns the category, if any.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Returns the tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Returns `true` if the tool carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|candidate| candidate == tag)
    }

    /// Returns whether the tool may be invoked.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the advisory rate limit.
    #[must_use]
    pub const fn rate_limit(&self) -> Option<RateLimit> {
        self.rate_limit
    }

    /// Returns the execution timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the metadata map.
    #[must_use]
    pub const fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    /// Returns `true` when an executor is attached.
    #[must_use]
    pub const fn has_executor(&self) -> bool {
        self.executor.is_some()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Enables the tool.
    pub fn enable(&mut self, clock: &impl Clock) {
        self.enabled = true;
        self.updated_at = clock.utc();
    }

    /// Disables the tool.
    pub fn disable(&mut self, clock: &impl Clock) {
        self.enabled = false;
        self.updated_at = clock.utc();
    }

    /// Returns the wire descriptor used by `tools/list`.
    #[must_use]
    pub fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name.as_str().to_owned(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }

    /// Executes the tool under its own timeout.
    ///
    /// # Errors
    ///
    /// See [`Tool::execute_with_cancellation`].
    pub async fn execute(
        &self,
        input: Map<String, Value>,
    ) -> Result<ToolResult, ToolExecutionError> {
        self.execute_with_cancellation(input, &CancellationToken::new())
            .await
    }

    /// Executes the tool under its own timeout, scoped to the caller's token.
    ///
    /// One worker task runs the executor. The caller observes exactly one of:
    /// the worker's result, the worker's error, the tool timeout, or the
    /// caller's cancellation. On timeout or cancellation the child token
    /// handed to the executor is cancelled and the worker task is aborted.
    ///
    /// A tool without an executor yields an error-flagged result reading
    /// [`HANDLER_NOT_CONFIGURED`] rather than an error.
    ///
    /// # Errors
    ///
    /// Returns [`ToolExecutionError::Executor`] when the executor fails,
    /// [`ToolExecutionError::DeadlineExceeded`] when the timeout elapses,
    /// [`ToolExecutionError::Cancelled`] when `parent` is cancelled first,
    /// or [`ToolExecutionError::Panicked`] when the worker panics.
    pub async fn execute_with_cancellation(
        &self,
        input: Map<String, Value>,
        parent: &CancellationToken,
    ) -> Result<ToolResult, ToolExecutionError> {
        let Some(executor) = self.executor.clone() else {
            return Ok(ToolResult::error_text(HANDLER_NOT_CONFIGURED));
        };

        let tool = self.name.as_str().to_owned();
        let token = parent.child_token();
        let worker_token = token.clone();
        let mut worker =
            tokio::spawn(async move { executor.execute(input, worker_token).await });

        debug!(tool = %tool, timeout_ms = self.timeout.as_millis(), "tool execution started");

        let outcome = tokio::select! {
            () = parent.cancelled() => Err(ToolExecutionError::Cancelled { tool: tool.clone() }),
            joined = tokio::time::timeout(self.timeout, &mut worker) => match joined {
                Err(_elapsed) => Err(ToolExecutionError::DeadlineExceeded {
                    tool: tool.clone(),
                    timeout: self.timeout,
                }),
                Ok(Err(_join_error)) => Err(ToolExecutionError::Panicked { tool: tool.clone() }),
                Ok(Ok(Err(cause))) => Err(ToolExecutionError::Executor {
                    tool: tool.clone(),
                    cause: Arc::from(cause),
                }),
                Ok(Ok(Ok(result))) => Ok(result),
            },
        };

        token.cancel();
        worker.abort();

        match &outcome {
            Ok(result) => debug!(
                tool = %tool,
                is_error = result.is_error(),
                "tool execution finished"
            ),
            Err(err) => warn!(tool = %tool, error = %err, "tool execution failed"),
        }

        outcome
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("category", &self.category)
            .field("tags", &self.tags)
            .field("enabled", &self.enabled)
            .field("timeout", &self.timeout)
            .field("has_executor", &self.executor.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::domain::{ExecutorError, FnExecutor, ToolContent};
    use async_trait::async_trait;
    use mockable::DefaultClock;
    use rstest::rstest;
    use serde_json::json;

    struct SleepyExecutor {
        delay: Duration,
    }

    #[async_trait]
    impl ToolExecutor for SleepyExecutor {
        async fn execute(
            &self,
            _input: Map<String, Value>,
            cancellation: CancellationToken,
        ) -> Result<ToolResult, ExecutorError> {
            tokio::select! {
                () = cancellation.cancelled() => Err("cancelled".into()),
                () = tokio::time::sleep(self.delay) => Ok(ToolResult::text("slept")),
            }
        }
    }

    fn echo_tool() -> Tool {
        let executor = FnExecutor::new(|input| {
            let message = input
                .get("message")
                .and_then(Value::as_str)
                .ok_or("message is required")?;
            Ok(ToolResult::text(message))
        });
        Tool::new(
            ToolName::new("echo").expect("valid name"),
            "Echo the input message",
            json!({"type": "object", "properties": {"message": {"type": "string"}}}),
            &DefaultClock,
        )
        .expect("valid tool")
        .with_executor(Arc::new(executor))
    }

    fn arguments(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_description_is_rejected(#[case] description: &str) {
        let result = Tool::new(
            ToolName::new("echo").expect("valid name"),
            description,
            json!({"type": "object"}),
            &DefaultClock,
        );
        assert!(matches!(result, Err(ToolDomainError::EmptyToolDescription)));
    }

    #[test]
    fn non_object_schema_is_rejected() {
        let result = Tool::new(
            ToolName::new("echo").expect("valid name"),
            "Echo",
            json!("string"),
            &DefaultClock,
        );
        assert!(matches!(result, Err(ToolDomainError::InvalidInputSchema)));
    }

    #[test]
    fn new_tool_defaults() {
        let tool = echo_tool();
        assert!(tool.is_enabled());
        assert_eq!(tool.timeout(), DEFAULT_TOOL_TIMEOUT);
        assert!(tool.rate_limit().is_none());
    }

    #[tokio::test]
    async fn echo_returns_success_result() {
        let result = echo_tool()
            .execute(arguments(json!({"message": "hi"})))
            .await
            .expect("echo should succeed");

        assert!(!result.is_error());
        assert_eq!(result.content(), &[ToolContent::text("hi")]);
    }

    #[tokio::test]
    async fn missing_executor_yields_error_flagged_result() {
        let tool = Tool::new(
            ToolName::new("unbound").expect("valid name"),
            "No executor",
            json!({"type": "object"}),
            &DefaultClock,
        )
        .expect("valid tool");

        let result = tool
            .execute(Map::new())
            .await
            .expect("missing executor is not an error");

        assert!(result.is_error());
        assert_eq!(
            serde_json::to_value(&result).expect("serialisable"),
            json!({
                "content": [{"type": "text", "text": "Tool handler not configured"}],
                "isError": true
            })
        );
    }

    #[tokio::test]
    async fn executor_failure_is_an_error() {
        let result = echo_tool().execute(Map::new()).await;
        assert!(matches!(result, Err(ToolExecutionError::Executor { .. })));
    }

    #[tokio::test]
    async fn timeout_is_distinguished() {
        let tool = echo_tool()
            .with_executor(Arc::new(SleepyExecutor {
                delay: Duration::from_secs(5),
            }))
            .with_timeout(Duration::from_millis(20))
            .expect("non-zero timeout");

        let error = tool
            .execute(Map::new())
            .await
            .expect_err("slow executor should time out");

        assert!(error.is_deadline_exceeded());
    }

    #[tokio::test]
    async fn caller_cancellation_is_distinguished() {
        let tool = echo_tool().with_executor(Arc::new(SleepyExecutor {
            delay: Duration::from_secs(5),
        }));
        let parent = CancellationToken::new();
        parent.cancel();

        let result = tool.execute_with_cancellation(Map::new(), &parent).await;

        assert!(matches!(result, Err(ToolExecutionError::Cancelled { .. })));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        assert!(matches!(
            echo_tool().with_timeout(Duration::ZERO),
            Err(ToolDomainError::ZeroTimeout)
        ));
    }

    #[test]
    fn disable_and_enable_toggle_flag() {
        let mut tool = echo_tool();
        tool.disable(&DefaultClock);
        assert!(!tool.is_enabled());
        tool.enable(&DefaultClock);
        assert!(tool.is_enabled());
    }
}
