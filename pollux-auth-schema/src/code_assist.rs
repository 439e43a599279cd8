//! Cloud Code `loadCodeAssist` request and response shapes used for project discovery.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fixed client metadata sent with `loadCodeAssist`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMetadata {
    pub ide_type: &'static str,
    pub platform: &'static str,
    pub plugin_type: &'static str,
}

impl Default for ClientMetadata {
    fn default() -> Self {
        Self {
            ide_type: "IDE_UNSPECIFIED",
            platform: "PLATFORM_UNSPECIFIED",
            plugin_type: "GEMINI",
        }
    }
}

impl ClientMetadata {
    /// Compact JSON form used for the `Client-Metadata` header.
    pub fn header_value(&self) -> String {
        format!(
            r#"{{"ideType":"{}","platform":"{}","pluginType":"{}"}}"#,
            self.ide_type, self.platform, self.plugin_type
        )
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadCodeAssistRequest {
    pub metadata: ClientMetadata,
}

/// The companion project appears either as a bare id or as an object with an `id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CompanionProject {
    Id(String),
    Object {
        #[serde(default)]
        id: Option<String>,
    },
    Other(Value),
}

impl CompanionProject {
    pub fn id(&self) -> Option<&str> {
        let id = match self {
            CompanionProject::Id(id) => Some(id.as_str()),
            CompanionProject::Object { id } => id.as_deref(),
            CompanionProject::Other(_) => None,
        };
        id.map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadCodeAssistResponse {
    #[serde(default)]
    pub cloudaicompanion_project: Option<CompanionProject>,
}

impl LoadCodeAssistResponse {
    pub fn project_id(&self) -> Option<&str> {
        self.cloudaicompanion_project
            .as_ref()
            .and_then(CompanionProject::id)
    }
}
