//! Built-in tools shipped with the server binary.

use crate::tool::domain::{ExecutorError, Tool, ToolDomainError, ToolExecutor, ToolName, ToolResult};
use async_trait::async_trait;
use mockable::Clock;
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Returns its `message` argument unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoExecutor;

#[async_trait]
impl ToolExecutor for EchoExecutor {
    async fn execute(
        &self,
        input: Map<String, Value>,
        _cancellation: CancellationToken,
    ) -> Result<ToolResult, ExecutorError> {
        let message = input
            .get("message")
            .and_then(Value::as_str)
            .ok_or("missing string argument 'message'")?;
        Ok(ToolResult::text(message))
    }
}

/// Builds the `echo` tool.
///
/// # Errors
///
/// Propagates [`ToolDomainError`] from tool construction.
pub fn echo_tool(clock: &impl Clock) -> Result<Tool, ToolDomainError> {
    let schema = json!({
        "type": "object",
        "properties": {
            "message": { "type": "string", "description": "Text to echo back" }
        },
        "required": ["message"]
    });
    Ok(Tool::new(ToolName::new("echo")?, "Echo the input message", schema, clock)?
        .with_category("utility")
        .with_executor(Arc::new(EchoExecutor)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockable::DefaultClock;

    #[tokio::test]
    async fn echo_tool_echoes_message() {
        let tool = echo_tool(&DefaultClock).expect("valid tool");
        let input = json!({"message": "hi"}).as_object().cloned().unwrap_or_default();

        let result = tool.execute(input).await.expect("echo succeeds");

        assert_eq!(result.joined_text(), "hi");
    }

    #[tokio::test]
    async fn echo_tool_rejects_missing_message() {
        let tool = echo_tool(&DefaultClock).expect("valid tool");
        assert!(tool.execute(Map::new()).await.is_err());
    }
}
