//! Server identity and negotiated capabilities.

use serde::{Deserialize, Serialize};

/// Name and version of a protocol participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    /// Participant name.
    pub name: String,
    /// Participant version.
    pub version: String,
}

impl Implementation {
    /// Creates an implementation descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Marker for capabilities without options; serialises as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyCapability {}

/// Tool capability options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    /// Whether list-changed notifications are sent.
    pub list_changed: bool,
}

/// Resource capability options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourcesCapability {
    /// Whether clients may subscribe to resource updates.
    pub subscribe: bool,
    /// Whether list-changed notifications are sent.
    pub list_changed: bool,
}

/// Prompt capability options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptsCapability {
    /// Whether list-changed notifications are sent.
    pub list_changed: bool,
}

/// Capabilities advertised in the `initialize` response.
///
/// # Examples
///
/// ```
/// use parley::session::domain::ServerCapabilities;
///
/// let value = serde_json::to_value(ServerCapabilities::standard(true)).expect("serialisable");
/// assert_eq!(value["resources"]["subscribe"], serde_json::json!(true));
/// assert_eq!(value["logging"], serde_json::json!({}));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerCapabilities {
    /// Tool support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
    /// Resource support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourcesCapability>,
    /// Prompt support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptsCapability>,
    /// Client-controlled log level support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<EmptyCapability>,
    /// Argument completion support.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completions: Option<EmptyCapability>,
}

impl ServerCapabilities {
    /// Advertises every feature, with resource subscriptions as configured.
    #[must_use]
    pub const fn standard(resource_subscribe: bool) -> Self {
        Self {
            tools: Some(ToolsCapability {
                list_changed: false,
            }),
            resources: Some(ResourcesCapability {
                subscribe: resource_subscribe,
                list_changed: false,
            }),
            prompts: Some(PromptsCapability {
                list_changed: false,
            }),
            logging: Some(EmptyCapability {}),
            completions: Some(EmptyCapability {}),
        }
    }

    /// Returns whether resource subscriptions were negotiated.
    #[must_use]
    pub const fn supports_resource_subscribe(&self) -> bool {
        matches!(
            self.resources,
            Some(ResourcesCapability {
                subscribe: true,
                ..
            })
        )
    }
}
