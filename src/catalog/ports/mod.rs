//! Port contracts for resource and prompt storage.

mod repository;

pub use repository::{
    CatalogRepositoryError, CatalogRepositoryResult, PromptRepository, ResourceRepository,
};
