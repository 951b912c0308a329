//! Prompt entity, argument metadata, and template rendering.

use super::{CatalogError, PromptGenerationError, PromptName, ProviderError};
use crate::conversation::domain::Role;
use async_trait::async_trait;
use minijinja::Environment;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Produces prompt messages from caller-supplied arguments.
#[async_trait]
pub trait PromptGenerator: Send + Sync {
    /// Generates the prompt messages.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] when generation fails.
    async fn generate(
        &self,
        arguments: &Map<String, Value>,
    ) -> Result<Vec<PromptMessage>, ProviderError>;
}

/// Content of a prompt message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PromptContent {
    /// Plain text.
    Text {
        /// The text.
        text: String,
    },
}

/// One message produced by a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    /// Speaker role.
    pub role: Role,
    /// Message content.
    pub content: PromptContent,
}

impl PromptMessage {
    /// Creates a text message.
    #[must_use]
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: PromptContent::Text { text: text.into() },
        }
    }
}

/// Result of `prompts/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRendering {
    /// Prompt description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Rendered messages.
    pub messages: Vec<PromptMessage>,
}

/// Declared prompt argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptArgument {
    /// Argument name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the argument must be supplied.
    #[serde(default)]
    pub required: bool,
    /// Values offered by `completion/complete`.
    #[serde(skip)]
    pub suggestions: Vec<String>,
}

impl PromptArgument {
    /// Declares an argument.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::EmptyArgumentName`] for a blank name.
    pub fn new(name: impl Into<String>, required: bool) -> Result<Self, CatalogError> {
        let normalized = name.into().trim().to_owned();
        if normalized.is_empty() {
            return Err(CatalogError::EmptyArgumentName);
        }
        Ok(Self {
            name: normalized,
            description: None,
            required,
            suggestions: Vec::new(),
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets completion suggestions.
    #[must_use]
    pub fn with_suggestions(
        mut self,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.suggestions = suggestions.into_iter().map(Into::into).collect();
        self
    }
}

/// Wire shape of a prompt as listed to protocol clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptDescriptor {
    /// Prompt name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared arguments.
    #[serde(default)]
    pub arguments: Vec<PromptArgument>,
}

/// A named, parameterised message template.
#[derive(Clone)]
pub struct Prompt {
    name: PromptName,
    description: Option<String>,
    arguments: Vec<PromptArgument>,
    generator: Option<Arc<dyn PromptGenerator>>,
}

impl Prompt {
    /// Creates a prompt without arguments or generator.
    #[must_use]
    pub const fn new(name: PromptName) -> Self {
        Self {
            name,
            description: None,
            arguments: Vec::new(),
            generator: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a declared argument.
    #[must_use]
    pub fn with_argument(mut self, argument: PromptArgument) -> Self {
        self.arguments.push(argument);
        self
    }

    /// Attaches the generator used by [`Prompt::render`].
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn PromptGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Returns the name.
    #[must_use]
    pub const fn name(&self) -> &PromptName {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the declared arguments.
    #[must_use]
    pub fn arguments(&self) -> &[PromptArgument] {
        &self.arguments
    }

    /// Returns the wire descriptor used by `prompts/list`.
    #[must_use]
    pub fn descriptor(&self) -> PromptDescriptor {
        PromptDescriptor {
            name: self.name.as_str().to_owned(),
            description: self.description.clone(),
            arguments: self.arguments.clone(),
        }
    }

    /// Returns suggestions for `argument` that start with `prefix`.
    #[must_use]
    pub fn complete_argument(&self, argument: &str, prefix: &str) -> Vec<String> {
        self.arguments
            .iter()
            .filter(|declared| declared.name == argument)
            .flat_map(|declared| declared.suggestions.iter())
            .filter(|candidate| candidate.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Validates required arguments and renders the prompt.
    ///
    /// # Errors
    ///
    /// Returns [`PromptGenerationError::MissingArgument`] for the first
    /// required argument absent from `arguments`,
    /// [`PromptGenerationError::NoGenerator`] when no generator is attached,
    /// or [`PromptGenerationError::Failed`] when generation fails.
    pub async fn render(
        &self,
        arguments: &Map<String, Value>,
    ) -> Result<PromptRendering, PromptGenerationError> {
        if let Some(missing) = self
            .arguments
            .iter()
            .find(|declared| declared.required && !arguments.contains_key(&declared.name))
        {
            return Err(PromptGenerationError::MissingArgument {
                prompt: self.name.as_str().to_owned(),
                argument: missing.name.clone(),
            });
        }

        let Some(generator) = &self.generator else {
            return Err(PromptGenerationError::NoGenerator {
                prompt: self.name.as_str().to_owned(),
            });
        };

        let messages = generator
            .generate(arguments)
            .await
            .map_err(|cause| PromptGenerationError::Failed {
                prompt: self.name.as_str().to_owned(),
                cause: Arc::from(cause),
            })?;

        Ok(PromptRendering {
            description: self.description.clone(),
            messages,
        })
    }
}

impl fmt::Debug for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prompt")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("arguments", &self.arguments)
            .field("has_generator", &self.generator.is_some())
            .finish()
    }
}

/// Generator rendering one `minijinja` template per message.
///
/// Prompt arguments are exposed to templates as top-level variables.
///
/// # Examples
///
/// ```
/// use parley::catalog::domain::TemplatePrompt;
/// use parley::conversation::domain::Role;
///
/// let generator = TemplatePrompt::new().message(Role::User, "Review {{ file }}");
/// # let _ = generator;
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplatePrompt {
    templates: Vec<(Role, String)>,
}

impl TemplatePrompt {
    /// Creates a generator without messages.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            templates: Vec::new(),
        }
    }

    /// Appends a message template.
    #[must_use]
    pub fn message(mut self, role: Role, template: impl Into<String>) -> Self {
        self.templates.push((role, template.into()));
        self
    }
}

#[async_trait]
impl PromptGenerator for TemplatePrompt {
    async fn generate(
        &self,
        arguments: &Map<String, Value>,
    ) -> Result<Vec<PromptMessage>, ProviderError> {
        let environment = Environment::new();
        self.templates
            .iter()
            .map(|(role, template)| {
                environment
                    .render_str(template, arguments)
                    .map(|text| PromptMessage::text(*role, text))
                    .map_err(ProviderError::from)
            })
            .collect()
    }
}
