//! Adapter implementations for conversation ports.

mod memory;

pub use memory::InMemoryConversationRepository;
