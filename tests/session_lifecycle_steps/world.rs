//! Shared world state for session lifecycle BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use parley::{
    event::InMemoryEventPublisher,
    session::{
        adapters::InMemorySessionRepository,
        domain::{Implementation, Session},
        services::{SessionService, SessionServiceError},
    },
    tool::adapters::InMemoryToolRepository,
};
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestSessionService = SessionService<
    InMemorySessionRepository,
    InMemoryToolRepository,
    InMemoryEventPublisher,
    DefaultClock,
>;

/// Scenario world for session lifecycle behaviour tests.
pub struct SessionWorld {
    /// The session service under test.
    pub service: TestSessionService,
    /// Publisher shared with the service.
    pub publisher: Arc<InMemoryEventPublisher>,
    /// Session opened by the scenario.
    pub session: Option<Arc<Session>>,
    /// Negotiated protocol version from the last successful initialize.
    pub negotiated_version: Option<String>,
    /// Error from the last failed service call.
    pub last_error: Option<SessionServiceError>,
}

impl SessionWorld {
    /// Creates a world with no open session.
    #[must_use]
    pub fn new() -> Self {
        let publisher = Arc::new(InMemoryEventPublisher::new());
        let service = SessionService::new(
            Arc::new(InMemorySessionRepository::new()),
            Arc::new(InMemoryToolRepository::new()),
            Arc::clone(&publisher),
            Arc::new(DefaultClock),
        );
        Self {
            service,
            publisher,
            session: None,
            negotiated_version: None,
            last_error: None,
        }
    }

    /// Returns the scenario session.
    pub fn session(&self) -> Result<&Arc<Session>, eyre::Report> {
        self.session
            .as_ref()
            .ok_or_else(|| eyre::eyre!("no session opened in scenario world"))
    }
}

impl Default for SessionWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> SessionWorld {
    SessionWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Server identity used for every scenario session.
pub fn server_info() -> Implementation {
    Implementation::new("parley", "0.1.0")
}
