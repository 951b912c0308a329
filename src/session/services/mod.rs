//! Application services for session lifecycle and registry persistence.

mod lifecycle;

pub use lifecycle::{
    SessionService, SessionServiceError, SessionServiceResult, publish_session_events,
};
