//! Session aggregate.

use super::{
    Implementation, LATEST_PROTOCOL_VERSION, LogLevel, ServerCapabilities, SessionError,
    SessionId, SessionState, negotiate_protocol_version,
};
use crate::catalog::domain::{Prompt, PromptName, Resource, ResourceUri};
use crate::conversation::domain::{Conversation, ConversationId};
use crate::event::{AggregateType, DomainEvent, EventKind};
use crate::lock::{read, write};
use crate::tool::domain::{Tool, ToolName};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

/// Payload of the `initialize` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// Negotiated protocol revision.
    pub protocol_version: String,
    /// Advertised capabilities.
    pub capabilities: ServerCapabilities,
    /// Server identity.
    pub server_info: Implementation,
}

#[derive(Debug)]
struct SessionInner {
    state: SessionState,
    protocol_version: Option<String>,
    client_info: Option<Implementation>,
    tools: BTreeMap<ToolName, Tool>,
    resources: BTreeMap<ResourceUri, Resource>,
    prompts: BTreeMap<PromptName, Prompt>,
    subscriptions: BTreeSet<ResourceUri>,
    conversations: BTreeMap<ConversationId, Arc<Conversation>>,
    log_level: LogLevel,
    metadata: HashMap<String, Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    events: Vec<DomainEvent>,
}

/// One client's protocol session.
///
/// A session owns the tool, resource, and prompt registries it serves, the
/// client's resource subscriptions, and every conversation created through
/// it. Mutations take the session's exclusive lock only for the field
/// update; reads take the shared lock. The lock is never held while calling
/// into a conversation.
///
/// # Examples
///
/// ```
/// use parley::session::domain::{Implementation, ServerCapabilities, Session, SessionState};
/// use mockable::DefaultClock;
///
/// let clock = DefaultClock;
/// let session = Session::new(
///     Implementation::new("parley", "0.1.0"),
///     ServerCapabilities::standard(true),
///     &clock,
/// );
/// session
///     .initialize(Implementation::new("inspector", "1.0"), "2025-03-26", &clock)
///     .expect("first initialize");
/// session.mark_ready(&clock);
/// assert_eq!(session.state(), SessionState::Ready);
/// ```
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    server_info: Implementation,
    capabilities: ServerCapabilities,
    inner: RwLock<SessionInner>,
}

impl Session {
    /// Creates a session in the `created` state.
    #[must_use]
    pub fn new(
        server_info: Implementation,
        capabilities: ServerCapabilities,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: SessionId::new(),
            server_info,
            capabilities,
            inner: RwLock::new(SessionInner {
                state: SessionState::Created,
                protocol_version: None,
                client_info: None,
                tools: BTreeMap::new(),
                resources: BTreeMap::new(),
                prompts: BTreeMap::new(),
                subscriptions: BTreeSet::new(),
                conversations: BTreeMap::new(),
                log_level: LogLevel::default(),
                metadata: HashMap::new(),
                created_at: timestamp,
                updated_at: timestamp,
                closed_at: None,
                events: Vec::new(),
            }),
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the server identity.
    #[must_use]
    pub const fn server_info(&self) -> &Implementation {
        &self.server_info
    }

    /// Returns the advertised capabilities.
    #[must_use]
    pub const fn capabilities(&self) -> &ServerCapabilities {
        &self.capabilities
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        read(&self.inner).state
    }

    /// Returns the negotiated protocol revision.
    #[must_use]
    pub fn protocol_version(&self) -> Option<String> {
        read(&self.inner).protocol_version.clone()
    }

    /// Returns the client identity supplied at initialization.
    #[must_use]
    pub fn client_info(&self) -> Option<Implementation> {
        read(&self.inner).client_info.clone()
    }

    /// Returns the current client log level.
    #[must_use]
    pub fn log_level(&self) -> LogLevel {
        read(&self.inner).log_level
    }

    /// Returns a metadata value.
    #[must_use]
    pub fn metadata(&self, key: &str) -> Option<Value> {
        read(&self.inner).metadata.get(key).cloned()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        read(&self.inner).created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        read(&self.inner).updated_at
    }

    /// Returns when the session was closed.
    #[must_use]
    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        read(&self.inner).closed_at
    }

    /// Accepts the `initialize` handshake and returns the negotiated
    /// protocol revision.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::AlreadyInitialized`] unless the session is in
    /// the `created` state; the stored client identity is left unchanged.
    pub fn initialize(
        &self,
        client_info: Implementation,
        requested_version: &str,
        clock: &impl Clock,
    ) -> Result<String, SessionError> {
        let mut inner = write(&self.inner);
        if inner.state != SessionState::Created {
            return Err(SessionError::AlreadyInitialized { state: inner.state });
        }

        let negotiated = negotiate_protocol_version(requested_version).to_owned();
        let client_name = client_info.name.clone();
        inner.state = SessionState::Initializing;
        inner.protocol_version = Some(negotiated.clone());
        inner.client_info = Some(client_info);
        self.record(
            &mut inner,
            EventKind::SessionInitialized {
                client_name,
                protocol_version: negotiated.clone(),
            },
            clock,
        );
        Ok(negotiated)
    }

    /// Moves an initializing session to `ready`.
    ///
    /// Returns `false` without changing anything from any other state.
    pub fn mark_ready(&self, clock: &impl Clock) -> bool {
        let mut inner = write(&self.inner);
        if inner.state != SessionState::Initializing {
            return false;
        }
        inner.state = SessionState::Ready;
        self.record(&mut inner, EventKind::SessionReady, clock);
        true
    }

    /// Closes the session and every conversation it owns.
    ///
    /// Closing is idempotent: later calls return the original `closed_at`
    /// and touch nothing.
    pub fn close(&self, clock: &impl Clock) -> DateTime<Utc> {
        let (closed_at, conversations) = {
            let mut inner = write(&self.inner);
            if let Some(closed_at) = inner.closed_at {
                return closed_at;
            }
            let timestamp = clock.utc();
            inner.state = SessionState::Closed;
            inner.closed_at = Some(timestamp);
            self.record(&mut inner, EventKind::SessionClosed, clock);
            let owned: Vec<Arc<Conversation>> = inner.conversations.values().cloned().collect();
            (timestamp, owned)
        };

        for conversation in conversations {
            conversation.close(clock);
        }
        closed_at
    }

    /// Registers a tool, replacing any tool with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SessionClosed`] once closed.
    pub fn register_tool(&self, tool: Tool, clock: &impl Clock) -> Result<(), SessionError> {
        let mut inner = write(&self.inner);
        ensure_open(&inner)?;
        let name = tool.name().as_str().to_owned();
        inner.tools.insert(tool.name().clone(), tool);
        self.record(&mut inner, EventKind::ToolRegistered { name }, clock);
        Ok(())
    }

    /// Removes a tool, returning whether it was registered.
    pub fn unregister_tool(&self, name: &ToolName, clock: &impl Clock) -> bool {
        let mut inner = write(&self.inner);
        if inner.tools.remove(name).is_none() {
            return false;
        }
        self.record(
            &mut inner,
            EventKind::ToolUnregistered {
                name: name.as_str().to_owned(),
            },
            clock,
        );
        true
    }

    /// Returns the tool named `name`.
    #[must_use]
    pub fn get_tool(&self, name: &str) -> Option<Tool> {
        let key = ToolName::new(name).ok()?;
        read(&self.inner).tools.get(&key).cloned()
    }

    /// Returns registered tools ordered by name, optionally only enabled ones.
    #[must_use]
    pub fn list_tools(&self, enabled_only: bool) -> Vec<Tool> {
        read(&self.inner)
            .tools
            .values()
            .filter(|tool| !enabled_only || tool.is_enabled())
            .cloned()
            .collect()
    }

    /// Registers a resource, replacing any resource with the same URI.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SessionClosed`] once closed.
    pub fn register_resource(
        &self,
        resource: Resource,
        clock: &impl Clock,
    ) -> Result<(), SessionError> {
        let mut inner = write(&self.inner);
        ensure_open(&inner)?;
        let uri = resource.uri().as_str().to_owned();
        inner.resources.insert(resource.uri().clone(), resource);
        self.record(&mut inner, EventKind::ResourceRegistered { uri }, clock);
        Ok(())
    }

    /// Removes a resource and any subscription to it, returning whether it
    /// was registered.
    pub fn unregister_resource(&self, uri: &ResourceUri, clock: &impl Clock) -> bool {
        let mut inner = write(&self.inner);
        if inner.resources.remove(uri).is_none() {
            return false;
        }
        inner.subscriptions.remove(uri);
        self.record(
            &mut inner,
            EventKind::ResourceUnregistered {
                uri: uri.as_str().to_owned(),
            },
            clock,
        );
        true
    }

    /// Returns the resource with `uri`.
    #[must_use]
    pub fn get_resource(&self, uri: &str) -> Option<Resource> {
        let key = ResourceUri::new(uri).ok()?;
        read(&self.inner).resources.get(&key).cloned()
    }

    /// Returns registered resources ordered by URI.
    #[must_use]
    pub fn list_resources(&self) -> Vec<Resource> {
        read(&self.inner).resources.values().cloned().collect()
    }

    /// Registers a prompt, replacing any prompt with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SessionClosed`] once closed.
    pub fn register_prompt(&self, prompt: Prompt, clock: &impl Clock) -> Result<(), SessionError> {
        let mut inner = write(&self.inner);
        ensure_open(&inner)?;
        let name = prompt.name().as_str().to_owned();
        inner.prompts.insert(prompt.name().clone(), prompt);
        self.record(&mut inner, EventKind::PromptRegistered { name }, clock);
        Ok(())
    }

    /// Removes a prompt, returning whether it was registered.
    pub fn unregister_prompt(&self, name: &PromptName, clock: &impl Clock) -> bool {
        let mut inner = write(&self.inner);
        if inner.prompts.remove(name).is_none() {
            return false;
        }
        self.record(
            &mut inner,
            EventKind::PromptUnregistered {
                name: name.as_str().to_owned(),
            },
            clock,
        );
        true
    }

    /// Returns the prompt named `name`.
    #[must_use]
    pub fn get_prompt(&self, name: &str) -> Option<Prompt> {
        let key = PromptName::new(name).ok()?;
        read(&self.inner).prompts.get(&key).cloned()
    }

    /// Returns registered prompts ordered by name.
    #[must_use]
    pub fn list_prompts(&self) -> Vec<Prompt> {
        read(&self.inner).prompts.values().cloned().collect()
    }

    /// Subscribes the client to updates of a registered resource.
    ///
    /// Subscribing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::CapabilityNotSupported`] when subscriptions
    /// were not negotiated, [`SessionError::SessionClosed`] once closed, or
    /// [`SessionError::ResourceNotFound`] for an unregistered URI.
    pub fn subscribe_resource(
        &self,
        uri: &ResourceUri,
        clock: &impl Clock,
    ) -> Result<(), SessionError> {
        if !self.capabilities.supports_resource_subscribe() {
            return Err(SessionError::CapabilityNotSupported {
                capability: "resources.subscribe",
            });
        }

        let mut inner = write(&self.inner);
        ensure_open(&inner)?;
        if !inner.resources.contains_key(uri) {
            return Err(SessionError::ResourceNotFound(uri.as_str().to_owned()));
        }
        if inner.subscriptions.insert(uri.clone()) {
            self.record(
                &mut inner,
                EventKind::ResourceSubscribed {
                    uri: uri.as_str().to_owned(),
                },
                clock,
            );
        }
        Ok(())
    }

    /// Cancels a subscription, returning whether one existed.
    pub fn unsubscribe_resource(&self, uri: &ResourceUri, clock: &impl Clock) -> bool {
        let mut inner = write(&self.inner);
        if !inner.subscriptions.remove(uri) {
            return false;
        }
        self.record(
            &mut inner,
            EventKind::ResourceUnsubscribed {
                uri: uri.as_str().to_owned(),
            },
            clock,
        );
        true
    }

    /// Returns whether the client is subscribed to `uri`.
    #[must_use]
    pub fn is_subscribed(&self, uri: &ResourceUri) -> bool {
        read(&self.inner).subscriptions.contains(uri)
    }

    /// Creates a conversation owned by this session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SessionClosed`] once closed or
    /// [`SessionError::Conversation`] for an invalid model.
    pub fn create_conversation(
        &self,
        model: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<Arc<Conversation>, SessionError> {
        let conversation = Arc::new(Conversation::new(self.id, model, clock)?);
        let created = EventKind::ConversationCreated {
            conversation_id: conversation.id().into_inner(),
            model: conversation.model(),
        };

        let mut inner = write(&self.inner);
        ensure_open(&inner)?;
        inner
            .conversations
            .insert(conversation.id(), Arc::clone(&conversation));
        self.record(&mut inner, created, clock);
        Ok(conversation)
    }

    /// Returns the conversation with `id`.
    #[must_use]
    pub fn get_conversation(&self, id: ConversationId) -> Option<Arc<Conversation>> {
        read(&self.inner).conversations.get(&id).cloned()
    }

    /// Returns every owned conversation.
    #[must_use]
    pub fn list_conversations(&self) -> Vec<Arc<Conversation>> {
        read(&self.inner).conversations.values().cloned().collect()
    }

    /// Sets the client log level from its wire name and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidLogLevel`] for an unknown level.
    pub fn set_log_level(&self, level: &str, clock: &impl Clock) -> Result<LogLevel, SessionError> {
        let parsed: LogLevel = level
            .parse()
            .map_err(|_| SessionError::InvalidLogLevel(level.to_owned()))?;
        let mut inner = write(&self.inner);
        inner.log_level = parsed;
        self.record(
            &mut inner,
            EventKind::LogLevelChanged {
                level: parsed.as_str().to_owned(),
            },
            clock,
        );
        Ok(parsed)
    }

    /// Sets a metadata entry.
    pub fn set_metadata(&self, key: impl Into<String>, value: Value, clock: &impl Clock) {
        let mut inner = write(&self.inner);
        inner.metadata.insert(key.into(), value);
        inner.updated_at = clock.utc();
    }

    /// Builds the `initialize` response payload.
    ///
    /// Before initialization the latest supported revision is reported.
    #[must_use]
    pub fn to_initialize_result(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: self
                .protocol_version()
                .unwrap_or_else(|| LATEST_PROTOCOL_VERSION.to_owned()),
            capabilities: self.capabilities,
            server_info: self.server_info.clone(),
        }
    }

    /// Returns a copy of the buffered events.
    #[must_use]
    pub fn events(&self) -> Vec<DomainEvent> {
        read(&self.inner).events.clone()
    }

    /// Discards the buffered events.
    pub fn clear_events(&self) {
        write(&self.inner).events.clear();
    }

    /// Returns and clears the buffered events.
    #[must_use]
    pub fn drain_events(&self) -> Vec<DomainEvent> {
        std::mem::take(&mut write(&self.inner).events)
    }

    fn record(&self, inner: &mut SessionInner, kind: EventKind, clock: &impl Clock) {
        let event = DomainEvent::record(AggregateType::Session, self.id.into_inner(), kind, clock);
        inner.updated_at = event.occurred_at();
        inner.events.push(event);
    }
}

const fn ensure_open(inner: &SessionInner) -> Result<(), SessionError> {
    if matches!(inner.state, SessionState::Closed) {
        return Err(SessionError::SessionClosed);
    }
    Ok(())
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
