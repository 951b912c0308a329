//! Parley: a Model Context Protocol server engine.
//!
//! The crate accepts JSON-RPC requests over a newline-delimited byte stream,
//! negotiates capabilities with the client, and serves registries of tools,
//! resources, and prompts. Conversations with a language model are driven
//! through the same session state.
//!
//! # Architecture
//!
//! Each bounded context follows hexagonal architecture:
//!
//! - **Domain**: aggregates, value objects, and their invariants
//! - **Ports**: async traits for persistence and remote services
//! - **Adapters**: in-memory implementations of those ports
//!
//! # Modules
//!
//! - [`session`]: session lifecycle, registries, and subscriptions
//! - [`conversation`]: message history, generation parameters, and turns
//! - [`tool`]: tool definitions and bounded, cancellable execution
//! - [`catalog`]: resources and prompts
//! - [`event`]: domain events and the pull-based outbox
//! - [`protocol`]: JSON-RPC framing and dispatch
//! - [`config`] and [`logging`]: process setup for the binary

pub mod catalog;
pub mod config;
pub mod conversation;
pub mod error;
pub mod event;
pub mod logging;
pub mod protocol;
pub mod session;
pub mod tool;

mod lock;
