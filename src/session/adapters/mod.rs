//! Adapters for session ports.

pub mod memory;

pub use memory::InMemorySessionRepository;
