//! Port contracts for conversation storage and the remote model.

mod model;
mod repository;

#[cfg(test)]
pub use model::MockModelService;
pub use model::{ModelEventStream, ModelService, ModelServiceError, ModelServiceResult};
pub use repository::{
    ConversationRepository, ConversationRepositoryError, ConversationRepositoryResult,
};
