use crate::error::CredentialError;
use serde_json::{Map, Value};
use std::sync::{Arc, PoisonError, RwLock, Weak};

/// Live credential handle attached to an [`Auth`](super::Auth). Never serialized.
#[derive(Debug, Clone)]
pub enum AuthRuntime {
    /// Owning handle held by the primary of a multi-project credential.
    Shared(Arc<SharedCredential>),
    /// Non-owning view held by each virtual per-project identity.
    Virtual(VirtualCredential),
}

impl AuthRuntime {
    pub fn as_shared(&self) -> Option<&Arc<SharedCredential>> {
        match self {
            AuthRuntime::Shared(shared) => Some(shared),
            AuthRuntime::Virtual(_) => None,
        }
    }

    pub fn as_virtual(&self) -> Option<&VirtualCredential> {
        match self {
            AuthRuntime::Virtual(v) => Some(v),
            AuthRuntime::Shared(_) => None,
        }
    }
}

/// The single refreshable token material behind one account that spans several projects.
///
/// The refresher that owns token rotation writes through [`SharedCredential::apply_refresh`];
/// every virtual identity reads the same state through its weak parent reference.
#[derive(Debug)]
pub struct SharedCredential {
    primary_id: String,
    email: String,
    project_ids: Vec<String>,
    metadata: RwLock<Map<String, Value>>,
}

impl SharedCredential {
    pub fn new(
        primary_id: impl Into<String>,
        email: impl Into<String>,
        metadata: Map<String, Value>,
        project_ids: Vec<String>,
    ) -> Arc<Self> {
        Arc::new(Self {
            primary_id: primary_id.into(),
            email: email.into(),
            project_ids,
            metadata: RwLock::new(metadata),
        })
    }

    pub fn primary_id(&self) -> &str {
        &self.primary_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn project_ids(&self) -> &[String] {
        &self.project_ids
    }

    /// Snapshot of the credential payload.
    pub fn metadata(&self) -> Map<String, Value> {
        self.metadata
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.token_field("access_token")
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.token_field("refresh_token")
    }

    /// Merge refreshed token fields into the shared payload.
    ///
    /// Keys are written both at the top level and, when the stored file nests its tokens
    /// under `token`, inside that object so either layout stays consistent.
    pub fn apply_refresh(&self, update: &Map<String, Value>) {
        let mut metadata = self
            .metadata
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for (key, value) in update {
            if let Some(Value::Object(token)) = metadata.get_mut("token") {
                token.insert(key.clone(), value.clone());
            }
            metadata.insert(key.clone(), value.clone());
        }
    }

    fn token_field(&self, key: &str) -> Option<String> {
        let metadata = self.metadata.read().unwrap_or_else(PoisonError::into_inner);
        metadata
            .get(key)
            .or_else(|| metadata.get("token").and_then(|t| t.get(key)))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// One project's view over a [`SharedCredential`].
#[derive(Debug, Clone)]
pub struct VirtualCredential {
    project_id: String,
    parent: Weak<SharedCredential>,
}

impl VirtualCredential {
    pub fn new(project_id: impl Into<String>, parent: &Arc<SharedCredential>) -> Self {
        Self {
            project_id: project_id.into(),
            parent: Arc::downgrade(parent),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Upgrade to the parent credential, if the primary still holds it.
    pub fn parent(&self) -> Result<Arc<SharedCredential>, CredentialError> {
        self.parent
            .upgrade()
            .ok_or_else(|| CredentialError::ParentReleased {
                project_id: self.project_id.clone(),
            })
    }

    /// Access token of the shared parent.
    pub fn access_token(&self) -> Result<String, CredentialError> {
        let parent = self.parent()?;
        parent
            .access_token()
            .ok_or_else(|| CredentialError::MissingAccessToken {
                id: parent.primary_id().to_string(),
            })
    }
}
