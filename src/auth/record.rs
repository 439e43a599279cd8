use super::runtime::AuthRuntime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Attribute keys used for routing and bookkeeping.
pub mod attr {
    pub const SOURCE: &str = "source";
    pub const PATH: &str = "path";
    pub const RUNTIME_ONLY: &str = "runtime_only";
    pub const VIRTUAL_PRIMARY: &str = "gemini_virtual_primary";
    pub const VIRTUAL_CHILDREN: &str = "virtual_children";
    pub const VIRTUAL_PARENT: &str = "gemini_virtual_parent";
    pub const VIRTUAL_PROJECT: &str = "gemini_virtual_project";
}

/// Selection status of an [`Auth`].
///
/// `Unknown` is the zero value a freshly minted login credential carries until the store
/// activates it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    #[default]
    Unknown,
    Active,
    Disabled,
}

/// A routable authentication identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Auth {
    pub id: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    pub status: AuthStatus,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub attributes: HashMap<String, String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    #[serde(skip)]
    pub runtime: Option<AuthRuntime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Auth {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn email(&self) -> Option<&str> {
        self.metadata_str("email").filter(|s| !s.is_empty())
    }

    pub fn is_virtual(&self) -> bool {
        self.attributes.contains_key(attr::VIRTUAL_PARENT)
    }

    /// Whether this record is eligible for selection by the router.
    pub fn is_selectable(&self) -> bool {
        !self.disabled && self.status != AuthStatus::Disabled
    }
}
