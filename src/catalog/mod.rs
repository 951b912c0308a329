//! Resources and prompts exposed to protocol clients.
//!
//! Resources are URI-addressed documents produced by a [`domain::ResourceReader`];
//! prompts are named message templates produced by a
//! [`domain::PromptGenerator`]. Both live in a session's registries and may be
//! persisted through the ports in [`ports`].

pub mod adapters;
pub mod domain;
pub mod ports;
