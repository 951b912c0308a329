//! Domain model for protocol sessions.
//!
//! A [`Session`] tracks one client's handshake state, serves the tool,
//! resource, and prompt registries, records resource subscriptions, and owns
//! the conversations created through it.

mod capabilities;
mod error;
mod ids;
mod log_level;
mod protocol_version;
mod session;
mod state;

pub use capabilities::{
    EmptyCapability, Implementation, PromptsCapability, ResourcesCapability, ServerCapabilities,
    ToolsCapability,
};
pub use error::SessionError;
pub use ids::SessionId;
pub use log_level::{LogLevel, ParseLogLevelError};
pub use protocol_version::{
    LATEST_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS, negotiate_protocol_version,
};
pub use session::{InitializeResult, Session};
pub use state::SessionState;
