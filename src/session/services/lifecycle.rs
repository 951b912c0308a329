//! Service layer coordinating sessions with their repositories.

use crate::event::{EventPublisher, publish_best_effort};
use crate::session::{
    domain::{Implementation, ServerCapabilities, Session, SessionError, SessionId},
    ports::{SessionRepository, SessionRepositoryError},
};
use crate::tool::{
    domain::{Tool, ToolName},
    ports::{ToolRepository, ToolRepositoryError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Drains a session's outbox and the outboxes of its conversations, then
/// publishes the events best-effort.
///
/// Returns the number of events delivered.
pub async fn publish_session_events<P>(publisher: &P, session: &Session) -> usize
where
    P: EventPublisher + ?Sized,
{
    let mut events = session.drain_events();
    for conversation in session.list_conversations() {
        events.extend(conversation.drain_events());
    }
    publish_best_effort(publisher, &events).await
}

/// Service-level errors for session lifecycle operations.
#[derive(Debug, Error)]
pub enum SessionServiceError {
    /// The session aggregate rejected the operation.
    #[error(transparent)]
    Session(#[from] SessionError),
    /// Session persistence failed.
    #[error(transparent)]
    SessionRepository(#[from] SessionRepositoryError),
    /// Tool persistence failed.
    #[error(transparent)]
    ToolRepository(#[from] ToolRepositoryError),
    /// No session exists with the given identifier.
    #[error("session {0} not found")]
    NotFound(SessionId),
}

/// Result type for session service operations.
pub type SessionServiceResult<T> = Result<T, SessionServiceError>;

/// Session lifecycle orchestration service.
///
/// Every operation mutates the in-memory aggregate first and persists
/// afterwards. The two steps are not atomic: when a repository fails, the
/// aggregate has already changed and the caller owns any compensation.
#[derive(Clone)]
pub struct SessionService<SR, TR, P, C>
where
    SR: SessionRepository,
    TR: ToolRepository,
    P: EventPublisher,
    C: Clock + Send + Sync,
{
    sessions: Arc<SR>,
    tools: Arc<TR>,
    publisher: Arc<P>,
    clock: Arc<C>,
}

impl<SR, TR, P, C> SessionService<SR, TR, P, C>
where
    SR: SessionRepository,
    TR: ToolRepository,
    P: EventPublisher,
    C: Clock + Send + Sync,
{
    /// Creates a new session service.
    #[must_use]
    pub const fn new(sessions: Arc<SR>, tools: Arc<TR>, publisher: Arc<P>, clock: Arc<C>) -> Self {
        Self {
            sessions,
            tools,
            publisher,
            clock,
        }
    }

    async fn find_session_or_error(&self, id: SessionId) -> SessionServiceResult<Arc<Session>> {
        self.sessions
            .find_by_id(id)
            .await?
            .ok_or(SessionServiceError::NotFound(id))
    }

    async fn publish_pending(&self, session: &Session) {
        publish_session_events(self.publisher.as_ref(), session).await;
    }

    /// Creates and stores a new session in the `created` state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::SessionRepository`] when the session
    /// cannot be stored.
    pub async fn open(
        &self,
        server_info: Implementation,
        capabilities: ServerCapabilities,
    ) -> SessionServiceResult<Arc<Session>> {
        let session = Arc::new(Session::new(server_info, capabilities, &*self.clock));
        self.sessions.save(&session).await?;
        info!(session_id = %session.id(), "session opened");
        Ok(session)
    }

    /// Initializes a stored session and marks it ready.
    ///
    /// Returns the negotiated protocol version.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::NotFound`] for an unknown session,
    /// [`SessionServiceError::Session`] when the session was already
    /// initialized, or a repository error.
    pub async fn initialize(
        &self,
        id: SessionId,
        client_info: Implementation,
        protocol_version: &str,
    ) -> SessionServiceResult<String> {
        let session = self.find_session_or_error(id).await?;
        let negotiated = session.initialize(client_info, protocol_version, &*self.clock)?;
        session.mark_ready(&*self.clock);
        self.publish_pending(&session).await;
        self.sessions.save(&session).await?;
        Ok(negotiated)
    }

    /// Registers a tool on a session, then persists the tool and the
    /// session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::Session`] when the session is closed.
    /// Repository errors are returned after the tool is already registered
    /// in memory.
    pub async fn register_tool(&self, id: SessionId, tool: Tool) -> SessionServiceResult<()> {
        let session = self.find_session_or_error(id).await?;
        session.register_tool(tool.clone(), &*self.clock)?;
        self.publish_pending(&session).await;

        if let Err(err) = self.tools.save(&tool).await {
            warn!(
                session_id = %id,
                tool = %tool.name(),
                error = %err,
                "tool registered in memory but not persisted"
            );
            return Err(err.into());
        }
        self.sessions.save(&session).await?;
        Ok(())
    }

    /// Removes a tool from a session and from the tool repository.
    ///
    /// Returns whether the session had the tool registered.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::NotFound`] for an unknown session or a
    /// repository error.
    pub async fn unregister_tool(
        &self,
        id: SessionId,
        name: &ToolName,
    ) -> SessionServiceResult<bool> {
        let session = self.find_session_or_error(id).await?;
        let removed = session.unregister_tool(name, &*self.clock);
        self.publish_pending(&session).await;
        self.tools.delete(name).await?;
        self.sessions.save(&session).await?;
        Ok(removed)
    }

    /// Closes a session and every conversation it owns.
    ///
    /// # Errors
    ///
    /// Returns [`SessionServiceError::NotFound`] for an unknown session or a
    /// repository error.
    pub async fn close(&self, id: SessionId) -> SessionServiceResult<()> {
        let session = self.find_session_or_error(id).await?;
        let closed_at = session.close(&*self.clock);
        self.publish_pending(&session).await;
        self.sessions.save(&session).await?;
        info!(session_id = %id, %closed_at, "session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, InMemoryEventPublisher};
    use crate::session::{adapters::InMemorySessionRepository, domain::SessionState};
    use crate::tool::{
        adapters::{InMemoryToolRepository, echo_tool},
        ports::ToolRepositoryResult,
    };
    use async_trait::async_trait;
    use mockable::DefaultClock;
    use rstest::rstest;

    type TestService<TR> =
        SessionService<InMemorySessionRepository, TR, InMemoryEventPublisher, DefaultClock>;

    struct FailingToolRepository;

    fn unavailable() -> ToolRepositoryError {
        ToolRepositoryError::persistence(std::io::Error::other("store unavailable"))
    }

    #[async_trait]
    impl ToolRepository for FailingToolRepository {
        async fn save(&self, _tool: &Tool) -> ToolRepositoryResult<()> {
            Err(unavailable())
        }

        async fn find_by_name(&self, _name: &ToolName) -> ToolRepositoryResult<Option<Tool>> {
            Err(unavailable())
        }

        async fn find_all(&self) -> ToolRepositoryResult<Vec<Tool>> {
            Err(unavailable())
        }

        async fn find_by_category(&self, _category: &str) -> ToolRepositoryResult<Vec<Tool>> {
            Err(unavailable())
        }

        async fn find_by_tag(&self, _tag: &str) -> ToolRepositoryResult<Vec<Tool>> {
            Err(unavailable())
        }

        async fn find_enabled(&self) -> ToolRepositoryResult<Vec<Tool>> {
            Err(unavailable())
        }

        async fn exists(&self, _name: &ToolName) -> ToolRepositoryResult<bool> {
            Err(unavailable())
        }

        async fn count(&self) -> ToolRepositoryResult<usize> {
            Err(unavailable())
        }

        async fn delete(&self, _name: &ToolName) -> ToolRepositoryResult<bool> {
            Err(unavailable())
        }
    }

    fn build_service<TR: ToolRepository>(
        tools: TR,
    ) -> (Arc<InMemoryEventPublisher>, TestService<TR>) {
        let publisher = Arc::new(InMemoryEventPublisher::new());
        let service = SessionService::new(
            Arc::new(InMemorySessionRepository::new()),
            Arc::new(tools),
            Arc::clone(&publisher),
            Arc::new(DefaultClock),
        );
        (publisher, service)
    }

    async fn ready_session<TR: ToolRepository>(service: &TestService<TR>) -> Arc<Session> {
        let session = service
            .open(
                Implementation::new("parley", "0.1.0"),
                ServerCapabilities::standard(true),
            )
            .await
            .expect("open should succeed");
        service
            .initialize(session.id(), Implementation::new("client", "1.0"), "2025-06-18")
            .await
            .expect("initialize should succeed");
        session
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn initialize_publishes_lifecycle_events() {
        let (publisher, service) = build_service(InMemoryToolRepository::new());

        let session = ready_session(&service).await;

        assert_eq!(session.state(), SessionState::Ready);
        let kinds: Vec<&'static str> = publisher
            .published()
            .iter()
            .map(|event| event.kind().as_str())
            .collect();
        assert_eq!(kinds, ["session_initialized", "session_ready"]);
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn register_tool_persists_tool() {
        let tools = InMemoryToolRepository::new();
        let (publisher, service) = build_service(tools.clone());
        let session = ready_session(&service).await;

        service
            .register_tool(session.id(), echo_tool(&DefaultClock).expect("valid tool"))
            .await
            .expect("registration should succeed");

        let name = ToolName::new("echo").expect("valid name");
        assert!(tools.exists(&name).await.expect("lookup"));
        assert!(session.get_tool("echo").is_some());
        assert!(
            publisher
                .published()
                .iter()
                .any(|event| matches!(event.kind(), EventKind::ToolRegistered { .. }))
        );
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn failed_persistence_leaves_tool_registered_in_memory() {
        let (_, service) = build_service(FailingToolRepository);
        let session = ready_session(&service).await;

        let result = service
            .register_tool(session.id(), echo_tool(&DefaultClock).expect("valid tool"))
            .await;

        assert!(matches!(
            result,
            Err(SessionServiceError::ToolRepository(_))
        ));
        assert!(session.get_tool("echo").is_some());
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn unknown_session_is_not_found() {
        let (_, service) = build_service(InMemoryToolRepository::new());

        let result = service.close(SessionId::new()).await;

        assert!(matches!(result, Err(SessionServiceError::NotFound(_))));
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn close_publishes_conversation_events() {
        let (publisher, service) = build_service(InMemoryToolRepository::new());
        let session = ready_session(&service).await;
        session
            .create_conversation("claude-sonnet", &DefaultClock)
            .expect("open session");

        service.close(session.id()).await.expect("close should succeed");

        let published = publisher.published();
        assert!(published.iter().any(|event| matches!(
            event.kind(),
            EventKind::ConversationStatusChanged { to, .. } if to == "closed"
        )));
        assert!(
            published
                .iter()
                .any(|event| matches!(event.kind(), EventKind::SessionClosed))
        );
    }

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn unregister_tool_reports_presence() {
        let (_, service) = build_service(InMemoryToolRepository::new());
        let session = ready_session(&service).await;
        let name = ToolName::new("echo").expect("valid name");
        service
            .register_tool(session.id(), echo_tool(&DefaultClock).expect("valid tool"))
            .await
            .expect("registration should succeed");

        assert!(service.unregister_tool(session.id(), &name).await.expect("unregister"));
        assert!(!service.unregister_tool(session.id(), &name).await.expect("unregister"));
    }
}
