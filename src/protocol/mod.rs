//! MCP wire protocol: JSON-RPC envelopes, line framing, and dispatch.
//!
//! Inbound lines are decoded by [`transport::FrameCodec`], classified by
//! [`jsonrpc::parse_line`], and routed by [`Dispatcher`] to the handlers in
//! [`handlers`]. Every failure becomes a JSON-RPC error object carrying the
//! code from [`ProtocolError::code`].

pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod jsonrpc;
pub mod transport;

pub use dispatcher::{Dispatcher, redact_params};
pub use error::{ErrorObject, ProtocolError};
pub use jsonrpc::{Incoming, Notification, RequestId, Response};
pub use transport::{DEFAULT_MAX_LINE_BYTES, Frame, FrameCodec, OutputSink, TransportError};
