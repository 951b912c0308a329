//! Port contracts for tool lookup.

mod repository;

pub use repository::{ToolRepository, ToolRepositoryError, ToolRepositoryResult};
