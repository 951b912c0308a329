//! JSON-RPC 2.0 envelopes.

use super::error::{ErrorObject, ProtocolError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Protocol version string every envelope must carry.
pub const JSONRPC_VERSION: &str = "2.0";

/// Request identifier: a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Numeric identifier.
    Number(i64),
    /// String identifier.
    String(String),
}

impl RequestId {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(number) => number.as_i64().map(Self::Number),
            Value::String(text) => Some(Self::String(text.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::String(text) => f.write_str(text),
        }
    }
}

/// A classified inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// A call that must be answered.
    Request {
        /// Correlation identifier.
        id: RequestId,
        /// Method name.
        method: String,
        /// Method parameters, if any.
        params: Option<Value>,
    },
    /// A fire-and-forget message that is never answered.
    Notification {
        /// Method name.
        method: String,
        /// Method parameters, if any.
        params: Option<Value>,
    },
}

impl Incoming {
    /// Returns the method name.
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            Self::Request { method, .. } | Self::Notification { method, .. } => method,
        }
    }
}

/// A line that could not be turned into an [`Incoming`] message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Identifier recovered from the envelope, if any.
    pub id: Option<RequestId>,
    /// Whether the envelope looked like a notification and must stay
    /// unanswered.
    pub silent: bool,
    /// Error to report.
    pub error: ProtocolError,
}

/// Parses and classifies one transport line.
///
/// # Errors
///
/// Returns a [`Rejection`] for invalid JSON, non-object payloads, a
/// `jsonrpc` member other than `"2.0"`, or a missing method name.
pub fn parse_line(line: &str) -> Result<Incoming, Rejection> {
    let value: Value = serde_json::from_str(line).map_err(|err| Rejection {
        id: None,
        silent: false,
        error: ProtocolError::Parse(err.to_string()),
    })?;

    let Value::Object(envelope) = value else {
        return Err(Rejection {
            id: None,
            silent: false,
            error: ProtocolError::InvalidRequest("expected a JSON object".to_owned()),
        });
    };

    classify(envelope)
}

fn classify(mut envelope: Map<String, Value>) -> Result<Incoming, Rejection> {
    let id = envelope.get("id").and_then(RequestId::from_value);
    let has_id = envelope.contains_key("id");
    let reject = |error: ProtocolError| Rejection {
        id: id.clone(),
        silent: !has_id && envelope_has_method(&envelope),
        error,
    };

    if envelope.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(reject(ProtocolError::InvalidRequest(
            "jsonrpc must be \"2.0\"".to_owned(),
        )));
    }
    let Some(method) = envelope.get("method").and_then(Value::as_str).map(str::to_owned) else {
        return Err(reject(ProtocolError::InvalidRequest(
            "method must be a string".to_owned(),
        )));
    };
    if has_id && id.is_none() {
        return Err(reject(ProtocolError::InvalidRequest(
            "id must be a string or an integer".to_owned(),
        )));
    }

    let params = envelope.remove("params");
    Ok(match id {
        Some(request_id) => Incoming::Request {
            id: request_id,
            method,
            params,
        },
        None => Incoming::Notification { method, params },
    })
}

fn envelope_has_method(envelope: &Map<String, Value>) -> bool {
    envelope.get("method").is_some_and(Value::is_string)
}

/// Outbound response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Identifier of the request being answered; `null` when unknown.
    pub id: Option<RequestId>,
    /// Success payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    /// Builds a success response.
    #[must_use]
    pub fn success(id: RequestId, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id: Some(id),
            result: Some(result),
            error: None,
        }
    }

    /// Builds an error response.
    #[must_use]
    pub fn failure(id: Option<RequestId>, error: &ProtocolError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            result: None,
            error: Some(error.to_error_object()),
        }
    }

    /// Returns whether this response carries an error.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Outbound notification envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Notification method.
    pub method: String,
    /// Notification parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl Notification {
    /// Builds a notification.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            method: method.into(),
            params,
        }
    }
}
