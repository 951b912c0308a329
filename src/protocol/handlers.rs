//! Request handlers operating on the current session.
//!
//! Each handler parses its own params, calls into the session, and returns
//! the JSON `result` payload. `initialize` lives in the dispatcher because
//! it replaces the session itself.

use super::error::ProtocolError;
use crate::catalog::domain::{Prompt, Resource, ResourceUri};
use crate::session::domain::Session;
use crate::tool::domain::Tool;
use mockable::Clock;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

/// Maximum number of values returned by `completion/complete`.
pub const MAX_COMPLETION_VALUES: usize = 100;

/// Result type for request handlers.
pub type HandlerResult = Result<Value, ProtocolError>;

pub(crate) fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, ProtocolError> {
    let value = params.unwrap_or_else(|| Value::Object(Map::new()));
    serde_json::from_value(value).map_err(|err| ProtocolError::InvalidParams(err.to_string()))
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct UriParams {
    uri: String,
}

#[derive(Debug, Deserialize)]
struct GetPromptParams {
    name: String,
    #[serde(default)]
    arguments: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct SetLevelParams {
    level: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum CompletionReference {
    #[serde(rename = "ref/prompt")]
    Prompt { name: String },
    #[serde(rename = "ref/resource")]
    Resource { uri: String },
}

#[derive(Debug, Deserialize)]
struct CompletionArgument {
    name: String,
    #[serde(default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct CompleteParams {
    #[serde(rename = "ref")]
    reference: CompletionReference,
    argument: CompletionArgument,
}

fn parse_uri(raw: &str) -> Result<ResourceUri, ProtocolError> {
    Ok(ResourceUri::new(raw)?)
}

fn to_result(value: impl serde::Serialize) -> HandlerResult {
    serde_json::to_value(value).map_err(|err| ProtocolError::internal(&err))
}

/// `ping`: answers with an empty object.
#[must_use]
pub fn ping() -> Value {
    json!({})
}

/// `tools/list`: enabled tools only.
#[must_use]
pub fn list_tools(session: &Session) -> Value {
    let tools: Vec<_> = session
        .list_tools(true)
        .iter()
        .map(Tool::descriptor)
        .collect();
    json!({ "tools": tools })
}

/// `tools/call`: runs an enabled tool under its timeout.
///
/// # Errors
///
/// Returns invalid params for malformed params or an unknown or disabled
/// tool, and a tool-execution error when the executor fails, times out, or
/// is cancelled.
pub async fn call_tool(session: &Session, params: Option<Value>) -> HandlerResult {
    let CallToolParams { name, arguments } = parse_params(params)?;
    let tool = session
        .get_tool(&name)
        .filter(Tool::is_enabled)
        .ok_or_else(|| ProtocolError::InvalidParams(format!("unknown tool: {name}")))?;

    let result = tool.execute(arguments).await?;
    to_result(result)
}

/// `resources/list`.
#[must_use]
pub fn list_resources(session: &Session) -> Value {
    let resources: Vec<_> = session
        .list_resources()
        .iter()
        .map(Resource::descriptor)
        .collect();
    json!({ "resources": resources })
}

/// `resources/read`.
///
/// # Errors
///
/// Returns resource-not-found for an unregistered URI and a resource-read
/// error when the resource has no reader or the reader fails.
pub async fn read_resource(session: &Session, params: Option<Value>) -> HandlerResult {
    let UriParams { uri } = parse_params(params)?;
    let resource = session
        .get_resource(&uri)
        .ok_or_else(|| ProtocolError::ResourceNotFound(uri))?;
    let contents = resource.read().await?;
    Ok(json!({ "contents": contents }))
}

/// `resources/subscribe`.
///
/// # Errors
///
/// Returns an error when the capability was not negotiated, the session is
/// closed, or the resource is unknown.
pub fn subscribe_resource(
    session: &Session,
    params: Option<Value>,
    clock: &impl Clock,
) -> HandlerResult {
    let UriParams { uri } = parse_params(params)?;
    session.subscribe_resource(&parse_uri(&uri)?, clock)?;
    Ok(json!({}))
}

/// `resources/unsubscribe`; unknown subscriptions are ignored.
///
/// # Errors
///
/// Returns invalid params for a malformed URI.
pub fn unsubscribe_resource(
    session: &Session,
    params: Option<Value>,
    clock: &impl Clock,
) -> HandlerResult {
    let UriParams { uri } = parse_params(params)?;
    session.unsubscribe_resource(&parse_uri(&uri)?, clock);
    Ok(json!({}))
}

/// `prompts/list`.
#[must_use]
pub fn list_prompts(session: &Session) -> Value {
    let prompts: Vec<_> = session
        .list_prompts()
        .iter()
        .map(Prompt::descriptor)
        .collect();
    json!({ "prompts": prompts })
}

/// `prompts/get`.
///
/// # Errors
///
/// Returns prompt-not-found for an unknown prompt, invalid params when a
/// required argument is missing, and an internal error when rendering
/// fails.
pub async fn get_prompt(session: &Session, params: Option<Value>) -> HandlerResult {
    let GetPromptParams { name, arguments } = parse_params(params)?;
    let prompt = session
        .get_prompt(&name)
        .ok_or_else(|| ProtocolError::PromptNotFound(name))?;
    let rendering = prompt.render(&arguments).await?;
    to_result(rendering)
}

/// `logging/setLevel`.
///
/// # Errors
///
/// Returns invalid params for an unknown level.
pub fn set_log_level(
    session: &Session,
    params: Option<Value>,
    clock: &impl Clock,
) -> HandlerResult {
    let SetLevelParams { level } = parse_params(params)?;
    session.set_log_level(&level, clock)?;
    Ok(json!({}))
}

/// `completion/complete`: prefix completion for prompt arguments and
/// resource URIs.
///
/// # Errors
///
/// Returns invalid params for malformed params and prompt-not-found for an
/// unknown prompt reference.
pub fn complete(session: &Session, params: Option<Value>) -> HandlerResult {
    let CompleteParams {
        reference,
        argument,
    } = parse_params(params)?;

    let mut values = match reference {
        CompletionReference::Prompt { name } => session
            .get_prompt(&name)
            .ok_or_else(|| ProtocolError::PromptNotFound(name))?
            .complete_argument(&argument.name, &argument.value),
        CompletionReference::Resource { uri: _template } => session
            .list_resources()
            .iter()
            .map(|resource| resource.uri().as_str().to_owned())
            .filter(|uri| uri.starts_with(&argument.value))
            .collect(),
    };

    let total = values.len();
    values.truncate(MAX_COMPLETION_VALUES);
    Ok(json!({
        "completion": {
            "values": values,
            "total": total,
            "hasMore": total > MAX_COMPLETION_VALUES,
        }
    }))
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
