//! JSON-RPC error mapping for domain and protocol failures.

use crate::catalog::domain::{CatalogError, PromptGenerationError, ResourceReadError};
use crate::error::ErrorKind;
use crate::session::domain::SessionError;
use crate::tool::domain::{ToolDomainError, ToolExecutionError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid JSON was received.
pub const PARSE_ERROR: i64 = -32700;
/// The JSON sent is not a valid request object.
pub const INVALID_REQUEST: i64 = -32600;
/// The method does not exist.
pub const METHOD_NOT_FOUND: i64 = -32601;
/// Invalid method parameters.
pub const INVALID_PARAMS: i64 = -32602;
/// Internal server error.
pub const INTERNAL_ERROR: i64 = -32603;
/// A tool executor failed.
pub const TOOL_EXECUTION_ERROR: i64 = -32000;
/// The requested resource is not registered.
pub const RESOURCE_NOT_FOUND: i64 = -32002;
/// The resource could not be read.
pub const RESOURCE_READ_ERROR: i64 = -32003;
/// The requested prompt is not registered.
pub const PROMPT_NOT_FOUND: i64 = -32004;
/// A request arrived before `initialize`.
pub const SESSION_NOT_INITIALIZED: i64 = -32005;

/// Errors answered to the client as JSON-RPC error objects.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The line was not valid JSON.
    #[error("parse error: {0}")]
    Parse(String),
    /// The envelope is not a valid JSON-RPC 2.0 request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// No handler is routed for the method.
    #[error("method not found: {0}")]
    MethodNotFound(String),
    /// The params are missing, malformed, or rejected.
    #[error("invalid params: {0}")]
    InvalidParams(String),
    /// Unexpected server-side failure.
    #[error("internal error: {0}")]
    Internal(String),
    /// A tool call failed.
    #[error("tool execution failed: {0}")]
    ToolExecution(String),
    /// The resource URI is not registered.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),
    /// The resource exists but could not be read.
    #[error("{0}")]
    ResourceRead(String),
    /// The prompt name is not registered.
    #[error("prompt not found: {0}")]
    PromptNotFound(String),
    /// The connection has no initialized session yet.
    #[error("session not initialized")]
    SessionNotInitialized,
}

impl ProtocolError {
    /// Returns the JSON-RPC error code for this error.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::Parse(_) => PARSE_ERROR,
            Self::InvalidRequest(_) => INVALID_REQUEST,
            Self::MethodNotFound(_) => METHOD_NOT_FOUND,
            Self::InvalidParams(_) => INVALID_PARAMS,
            Self::Internal(_) => INTERNAL_ERROR,
            Self::ToolExecution(_) => TOOL_EXECUTION_ERROR,
            Self::ResourceNotFound(_) => RESOURCE_NOT_FOUND,
            Self::ResourceRead(_) => RESOURCE_READ_ERROR,
            Self::PromptNotFound(_) => PROMPT_NOT_FOUND,
            Self::SessionNotInitialized => SESSION_NOT_INITIALIZED,
        }
    }

    /// Wraps any other failure as an internal error.
    pub fn internal(err: &impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    /// Returns the wire representation of this error.
    #[must_use]
    pub fn to_error_object(&self) -> ErrorObject {
        ErrorObject {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// JSON-RPC `error` member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable description.
    pub message: String,
}

impl From<SessionError> for ProtocolError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::ResourceNotFound(uri) => Self::ResourceNotFound(uri),
            SessionError::PromptNotFound(name) => Self::PromptNotFound(name),
            other => match other.kind() {
                ErrorKind::Validation | ErrorKind::NotFound => {
                    Self::InvalidParams(other.to_string())
                }
                ErrorKind::Conflict | ErrorKind::Capability => {
                    Self::InvalidRequest(other.to_string())
                }
            },
        }
    }
}

impl From<CatalogError> for ProtocolError {
    fn from(err: CatalogError) -> Self {
        Self::InvalidParams(err.to_string())
    }
}

impl From<ToolDomainError> for ProtocolError {
    fn from(err: ToolDomainError) -> Self {
        Self::InvalidParams(err.to_string())
    }
}

impl From<ToolExecutionError> for ProtocolError {
    fn from(err: ToolExecutionError) -> Self {
        Self::ToolExecution(err.to_string())
    }
}

impl From<ResourceReadError> for ProtocolError {
    fn from(err: ResourceReadError) -> Self {
        Self::ResourceRead(err.to_string())
    }
}

impl From<PromptGenerationError> for ProtocolError {
    fn from(err: PromptGenerationError) -> Self {
        match err.kind() {
            Some(ErrorKind::Validation) => Self::InvalidParams(err.to_string()),
            _ => Self::internal(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::domain::SessionState;
    use rstest::rstest;

    #[rstest]
    #[case(SessionError::ResourceNotFound("file:///x".to_owned()), RESOURCE_NOT_FOUND)]
    #[case(SessionError::PromptNotFound("review".to_owned()), PROMPT_NOT_FOUND)]
    #[case(SessionError::InvalidLogLevel("loud".to_owned()), INVALID_PARAMS)]
    #[case(SessionError::ToolNotFound("nope".to_owned()), INVALID_PARAMS)]
    #[case(SessionError::SessionClosed, INVALID_REQUEST)]
    #[case(
        SessionError::AlreadyInitialized { state: SessionState::Ready },
        INVALID_REQUEST
    )]
    #[case(
        SessionError::CapabilityNotSupported { capability: "resources.subscribe" },
        INVALID_REQUEST
    )]
    fn session_errors_map_to_codes(#[case] err: SessionError, #[case] code: i64) {
        assert_eq!(ProtocolError::from(err).code(), code);
    }

    #[rstest]
    fn missing_prompt_argument_is_invalid_params() {
        let err = PromptGenerationError::MissingArgument {
            prompt: "review".to_owned(),
            argument: "file".to_owned(),
        };

        assert_eq!(ProtocolError::from(err).code(), INVALID_PARAMS);
    }

    #[rstest]
    fn prompt_without_generator_is_internal() {
        let err = PromptGenerationError::NoGenerator {
            prompt: "review".to_owned(),
        };

        assert_eq!(ProtocolError::from(err).code(), INTERNAL_ERROR);
    }

    #[rstest]
    fn error_object_carries_code_and_message() {
        let object = ProtocolError::MethodNotFound("tools/explode".to_owned()).to_error_object();

        assert_eq!(object.code, METHOD_NOT_FOUND);
        assert_eq!(object.message, "method not found: tools/explode");
    }
}
