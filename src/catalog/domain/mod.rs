//! Domain model for resources and prompts.

mod error;
mod prompt;
mod prompt_name;
mod resource;
mod uri;

pub use error::{CatalogError, PromptGenerationError, ProviderError, ResourceReadError};
pub use prompt::{
    Prompt, PromptArgument, PromptContent, PromptDescriptor, PromptGenerator, PromptMessage,
    PromptRendering, TemplatePrompt,
};
pub use prompt_name::PromptName;
pub use resource::{
    Resource, ResourceContents, ResourceDescriptor, ResourceReader, StaticResource,
};
pub use uri::ResourceUri;
