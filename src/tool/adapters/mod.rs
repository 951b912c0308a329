//! Adapter implementations for tool ports plus built-in tools.

mod builtin;
mod memory;

pub use builtin::{EchoExecutor, echo_tool};
pub use memory::InMemoryToolRepository;
