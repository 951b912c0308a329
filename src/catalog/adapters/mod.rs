//! In-memory adapters for catalog ports.

mod memory;

pub use memory::{InMemoryPromptRepository, InMemoryResourceRepository};
