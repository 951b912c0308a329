//! Routes JSON-RPC traffic onto the connection's current session.

use super::error::ProtocolError;
use super::handlers::{self, HandlerResult, parse_params};
use super::jsonrpc::{Incoming, Notification, RequestId, Response, parse_line};
use super::transport::{DEFAULT_MAX_LINE_BYTES, Frame, OutputSink, TransportError, frame_reader};
use crate::catalog::domain::{Prompt, Resource, ResourceUri};
use crate::event::EventPublisher;
use crate::lock::{read, write};
use crate::session::domain::{Implementation, LogLevel, ServerCapabilities, Session};
use crate::session::services::publish_session_events;
use crate::tool::domain::Tool;
use futures::StreamExt;
use mockable::Clock;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::sync::{Arc, RwLock};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

const REDACTED: &str = "[REDACTED]";

/// Methods answered without an initialized session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Initialize,
    Ping,
    Session(SessionMethod),
}

/// Methods that operate on the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionMethod {
    ToolsList,
    ToolsCall,
    ResourcesList,
    ResourcesRead,
    ResourcesSubscribe,
    ResourcesUnsubscribe,
    PromptsList,
    PromptsGet,
    LoggingSetLevel,
    CompletionComplete,
}

impl Method {
    fn parse(name: &str) -> Option<Self> {
        let method = match name {
            "initialize" => Self::Initialize,
            "ping" => Self::Ping,
            "tools/list" => Self::Session(SessionMethod::ToolsList),
            "tools/call" => Self::Session(SessionMethod::ToolsCall),
            "resources/list" => Self::Session(SessionMethod::ResourcesList),
            "resources/read" => Self::Session(SessionMethod::ResourcesRead),
            "resources/subscribe" => Self::Session(SessionMethod::ResourcesSubscribe),
            "resources/unsubscribe" => Self::Session(SessionMethod::ResourcesUnsubscribe),
            "prompts/list" => Self::Session(SessionMethod::PromptsList),
            "prompts/get" => Self::Session(SessionMethod::PromptsGet),
            "logging/setLevel" => Self::Session(SessionMethod::LoggingSetLevel),
            "completion/complete" => Self::Session(SessionMethod::CompletionComplete),
            _ => return None,
        };
        Some(method)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InitializeParams {
    protocol_version: String,
    client_info: Implementation,
}

/// JSON-RPC dispatcher for one connection.
///
/// The dispatcher holds at most one live session. `initialize` builds a new
/// session, seeds it with the configured tools, resources, and prompts,
/// marks it ready, and installs it; a previously installed session is
/// closed. Requests are handled one at a time by [`Dispatcher::serve`];
/// [`Dispatcher::send_notification`] may be called concurrently from other
/// tasks and shares the same output lock.
pub struct Dispatcher<W, P, C> {
    server_info: Implementation,
    capabilities: ServerCapabilities,
    tools: Vec<Tool>,
    resources: Vec<Resource>,
    prompts: Vec<Prompt>,
    session: RwLock<Option<Arc<Session>>>,
    output: OutputSink<W>,
    publisher: Arc<P>,
    clock: Arc<C>,
    max_line_bytes: usize,
}

impl<W, P, C> Dispatcher<W, P, C>
where
    W: AsyncWrite + Unpin + Send,
    P: EventPublisher,
    C: Clock + Send + Sync,
{
    /// Creates a dispatcher writing responses to `writer`.
    #[must_use]
    pub fn new(
        server_info: Implementation,
        capabilities: ServerCapabilities,
        writer: W,
        publisher: Arc<P>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            server_info,
            capabilities,
            tools: Vec::new(),
            resources: Vec::new(),
            prompts: Vec::new(),
            session: RwLock::new(None),
            output: OutputSink::new(writer),
            publisher,
            clock,
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
        }
    }

    /// Registers `tool` on every session this dispatcher creates.
    #[must_use]
    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Registers `resource` on every session this dispatcher creates.
    #[must_use]
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Registers `prompt` on every session this dispatcher creates.
    #[must_use]
    pub fn with_prompt(mut self, prompt: Prompt) -> Self {
        self.prompts.push(prompt);
        self
    }

    /// Overrides the inbound line limit.
    #[must_use]
    pub const fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Returns the current session, if `initialize` has succeeded.
    #[must_use]
    pub fn current_session(&self) -> Option<Arc<Session>> {
        read(&self.session).clone()
    }

    /// Reads frames from `reader` until end of input, answering each request.
    ///
    /// A failing request never stops the loop; only transport failures do.
    /// The current session is closed when the input ends.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when reading or writing the stream fails.
    pub async fn serve<R>(&self, reader: R) -> Result<(), TransportError>
    where
        R: AsyncRead + Unpin,
    {
        let mut frames = frame_reader(reader, self.max_line_bytes);
        while let Some(next) = frames.next().await {
            if let Some(response) = self.handle_frame(next?).await {
                self.output.send(&response).await?;
            }
        }

        info!("input closed; shutting down session");
        let finished = write(&self.session).take();
        if let Some(session) = finished {
            session.close(&*self.clock);
            publish_session_events(self.publisher.as_ref(), &session).await;
        }
        Ok(())
    }

    /// Handles one decoded frame, returning the response to write, if any.
    pub async fn handle_frame(&self, frame: Frame) -> Option<Response> {
        match frame {
            Frame::Line(line) => self.handle_line(&line).await,
            Frame::Oversized => {
                warn!(limit = self.max_line_bytes, "discarded oversized line");
                let error = ProtocolError::InvalidRequest(format!(
                    "message exceeds {} bytes",
                    self.max_line_bytes
                ));
                Some(Response::failure(None, &error))
            }
            Frame::Malformed => {
                warn!("discarded line that is not valid UTF-8");
                let error = ProtocolError::Parse("line is not valid UTF-8".to_owned());
                Some(Response::failure(None, &error))
            }
        }
    }

    /// Handles one transport line, returning the response to write, if any.
    ///
    /// Notifications and malformed notifications produce no response.
    pub async fn handle_line(&self, line: &str) -> Option<Response> {
        if line.trim().is_empty() {
            return None;
        }
        match parse_line(line) {
            Ok(Incoming::Request { id, method, params }) if is_notification(&method) => {
                debug!(%id, method, "notification carried an id; not answering");
                handle_notification(&method, params.as_ref());
                None
            }
            Ok(Incoming::Request { id, method, params }) => {
                Some(self.handle_request(id, &method, params).await)
            }
            Ok(Incoming::Notification { method, params }) => {
                handle_notification(&method, params.as_ref());
                None
            }
            Err(rejection) => {
                warn!(
                    code = rejection.error.code(),
                    error = %rejection.error,
                    "rejected inbound message"
                );
                if rejection.silent {
                    None
                } else {
                    Some(Response::failure(rejection.id, &rejection.error))
                }
            }
        }
    }

    async fn handle_request(&self, id: RequestId, method: &str, params: Option<Value>) -> Response {
        let audit = redact_params(params.as_ref());
        let outcome = self.route(method, params).await;

        match &outcome {
            Ok(_) => info!(%id, method, outcome = "ok", params = %audit, "handled request"),
            Err(err) => info!(
                %id,
                method,
                outcome = "error",
                code = err.code(),
                error = %err,
                params = %audit,
                "handled request"
            ),
        }

        if let Some(session) = self.current_session() {
            publish_session_events(self.publisher.as_ref(), &session).await;
        }

        match outcome {
            Ok(result) => Response::success(id, result),
            Err(err) => Response::failure(Some(id), &err),
        }
    }

    async fn route(&self, name: &str, params: Option<Value>) -> HandlerResult {
        let method =
            Method::parse(name).ok_or_else(|| ProtocolError::MethodNotFound(name.to_owned()))?;
        match method {
            Method::Initialize => self.initialize(params).await,
            Method::Ping => Ok(handlers::ping()),
            Method::Session(session_method) => {
                let session = self
                    .current_session()
                    .ok_or(ProtocolError::SessionNotInitialized)?;
                self.route_session(session_method, &session, params).await
            }
        }
    }

    async fn route_session(
        &self,
        method: SessionMethod,
        session: &Session,
        params: Option<Value>,
    ) -> HandlerResult {
        let clock = &*self.clock;
        match method {
            SessionMethod::ToolsList => Ok(handlers::list_tools(session)),
            SessionMethod::ToolsCall => handlers::call_tool(session, params).await,
            SessionMethod::ResourcesList => Ok(handlers::list_resources(session)),
            SessionMethod::ResourcesRead => handlers::read_resource(session, params).await,
            SessionMethod::ResourcesSubscribe => {
                handlers::subscribe_resource(session, params, clock)
            }
            SessionMethod::ResourcesUnsubscribe => {
                handlers::unsubscribe_resource(session, params, clock)
            }
            SessionMethod::PromptsList => Ok(handlers::list_prompts(session)),
            SessionMethod::PromptsGet => handlers::get_prompt(session, params).await,
            SessionMethod::LoggingSetLevel => handlers::set_log_level(session, params, clock),
            SessionMethod::CompletionComplete => handlers::complete(session, params),
        }
    }

    async fn initialize(&self, params: Option<Value>) -> HandlerResult {
        let InitializeParams {
            protocol_version,
            client_info,
        } = parse_params(params)?;
        let clock = &*self.clock;

        let session = Arc::new(Session::new(
            self.server_info.clone(),
            self.capabilities,
            clock,
        ));
        self.seed(&session)?;
        let negotiated = session.initialize(client_info, &protocol_version, clock)?;
        session.mark_ready(clock);

        let previous = write(&self.session).replace(Arc::clone(&session));
        if let Some(retired) = previous {
            info!(session_id = %retired.id(), "closing session replaced by initialize");
            retired.close(clock);
            publish_session_events(self.publisher.as_ref(), &retired).await;
        }

        info!(
            session_id = %session.id(),
            protocol_version = %negotiated,
            "session initialized"
        );
        serde_json::to_value(session.to_initialize_result())
            .map_err(|err| ProtocolError::internal(&err))
    }

    fn seed(&self, session: &Session) -> Result<(), ProtocolError> {
        let clock = &*self.clock;
        for tool in &self.tools {
            session.register_tool(tool.clone(), clock)?;
        }
        for resource in &self.resources {
            session.register_resource(resource.clone(), clock)?;
        }
        for prompt in &self.prompts {
            session.register_prompt(prompt.clone(), clock)?;
        }
        Ok(())
    }

    /// Writes a server-initiated notification.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the write fails.
    pub async fn send_notification(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<(), TransportError> {
        debug!(method, "sending notification");
        self.output.send(&Notification::new(method, params)).await
    }

    /// Pushes `notifications/resources/updated` when the client subscribed
    /// to `uri`.
    ///
    /// Returns whether a notification was sent.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the write fails.
    pub async fn notify_resource_updated(&self, uri: &ResourceUri) -> Result<bool, TransportError> {
        let subscribed = self
            .current_session()
            .is_some_and(|session| session.is_subscribed(uri));
        if !subscribed {
            return Ok(false);
        }
        self.send_notification(
            "notifications/resources/updated",
            Some(json!({ "uri": uri.as_str() })),
        )
        .await?;
        Ok(true)
    }

    /// Pushes a `notifications/message` log entry when `level` meets the
    /// session's configured minimum.
    ///
    /// Returns whether a notification was sent.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the write fails.
    pub async fn log_to_client(
        &self,
        level: LogLevel,
        logger: Option<&str>,
        data: Value,
    ) -> Result<bool, TransportError> {
        let enabled = self
            .current_session()
            .is_some_and(|session| level >= session.log_level());
        if !enabled {
            return Ok(false);
        }

        let mut params = Map::new();
        params.insert("level".to_owned(), json!(level.as_str()));
        if let Some(name) = logger {
            params.insert("logger".to_owned(), json!(name));
        }
        params.insert("data".to_owned(), data);
        self.send_notification("notifications/message", Some(Value::Object(params)))
            .await?;
        Ok(true)
    }
}

/// Methods that are notifications whether or not the client sent an id.
fn is_notification(method: &str) -> bool {
    matches!(
        method,
        "notifications/initialized" | "initialized" | "notifications/cancelled" | "cancelled"
    )
}

fn handle_notification(method: &str, params: Option<&Value>) {
    match method {
        "notifications/initialized" | "initialized" => {
            debug!(method, "client finished initialization");
        }
        "notifications/cancelled" | "cancelled" => {
            let request_id = params.and_then(|value| value.get("requestId"));
            debug!(method, request_id = ?request_id, "client cancelled request");
        }
        _ => debug!(method, "ignoring unknown notification"),
    }
}

/// Returns a copy of `params` with secret-looking members replaced.
///
/// A member is redacted when its key, lowercased, contains `token`,
/// `secret`, `password`, or `credential`, or equals `api_key`, `apikey`, or
/// `authorization`.
#[must_use]
pub fn redact_params(params: Option<&Value>) -> Value {
    params.map_or(Value::Null, redact_value)
}

fn redact_value(value: &Value) -> Value {
    match value {
        Value::Object(members) => Value::Object(
            members
                .iter()
                .map(|(key, member)| {
                    let redacted = if is_sensitive_key(key) {
                        Value::String(REDACTED.to_owned())
                    } else {
                        redact_value(member)
                    };
                    (key.clone(), redacted)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_value).collect()),
        other => other.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    matches!(normalized.as_str(), "api_key" | "apikey" | "authorization")
        || ["token", "secret", "password", "credential"]
            .iter()
            .any(|needle| normalized.contains(needle))
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
