use crate::auth::{Auth, AuthRuntime, AuthStatus, SharedCredential, VirtualCredential, attr};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Split a multi-project gemini credential into per-project virtual records.
///
/// Returns an empty list (and leaves `primary` untouched) when fewer than two distinct
/// project ids are present. Otherwise `primary` is disabled, takes ownership of the shared
/// credential, and the virtuals are returned in canonical project order.
pub fn synthesize_gemini_virtual_auths(
    primary: &mut Auth,
    metadata: &Map<String, Value>,
) -> Vec<Auth> {
    let projects = split_project_ids(metadata);
    if projects.len() <= 1 {
        return Vec::new();
    }

    let email = metadata
        .get("email")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let shared = SharedCredential::new(
        primary.id.clone(),
        email.clone(),
        metadata.clone(),
        projects.clone(),
    );

    primary.disabled = true;
    primary.status = AuthStatus::Disabled;
    primary.runtime = Some(AuthRuntime::Shared(shared.clone()));
    primary
        .attributes
        .insert(attr::VIRTUAL_PRIMARY.to_string(), "true".to_string());
    primary
        .attributes
        .insert(attr::VIRTUAL_CHILDREN.to_string(), projects.join(","));

    let source = primary.attribute(attr::SOURCE).map(str::to_string);
    let auth_path = primary.attribute(attr::PATH).map(str::to_string);
    let provider = if primary.provider.is_empty() {
        "gemini-cli".to_string()
    } else {
        primary.provider.clone()
    };
    let label = if primary.label.is_empty() {
        provider.clone()
    } else {
        primary.label.clone()
    };
    let proxy = primary
        .proxy_url
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string);
    let kind = metadata.get("type").cloned().unwrap_or(Value::Null);

    projects
        .iter()
        .map(|project_id| {
            let mut attributes = HashMap::from([
                (attr::RUNTIME_ONLY.to_string(), "true".to_string()),
                (attr::VIRTUAL_PARENT.to_string(), primary.id.clone()),
                (attr::VIRTUAL_PROJECT.to_string(), project_id.clone()),
            ]);
            if let Some(source) = source.as_ref().filter(|s| !s.is_empty()) {
                attributes.insert(attr::SOURCE.to_string(), source.clone());
            }
            if let Some(path) = auth_path.as_ref().filter(|p| !p.is_empty()) {
                attributes.insert(attr::PATH.to_string(), path.clone());
            }

            let mut virtual_metadata = Map::new();
            virtual_metadata.insert("email".to_string(), Value::String(email.clone()));
            virtual_metadata.insert("project_id".to_string(), Value::String(project_id.clone()));
            virtual_metadata.insert("virtual".to_string(), Value::Bool(true));
            virtual_metadata.insert(
                "virtual_parent_id".to_string(),
                Value::String(primary.id.clone()),
            );
            virtual_metadata.insert("type".to_string(), kind.clone());
            if let Some(proxy) = proxy.as_ref() {
                virtual_metadata.insert("proxy_url".to_string(), Value::String(proxy.clone()));
            }

            Auth {
                id: build_virtual_id(&primary.id, project_id),
                provider: provider.clone(),
                file_name: None,
                label: format!("{label} [{project_id}]"),
                prefix: primary.prefix.clone(),
                status: AuthStatus::Active,
                disabled: false,
                attributes,
                metadata: virtual_metadata,
                proxy_url: primary.proxy_url.clone(),
                runtime: Some(AuthRuntime::Virtual(VirtualCredential::new(
                    project_id.clone(),
                    &shared,
                ))),
                created_at: primary.created_at,
                updated_at: primary.updated_at,
            }
        })
        .collect()
}

/// Canonical project list: comma-split, trimmed, empty parts dropped, first occurrence kept.
pub fn split_project_ids(metadata: &Map<String, Value>) -> Vec<String> {
    let raw = metadata
        .get("project_id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// Deterministic id of the virtual record for `project_id` under `base_id`.
pub fn build_virtual_id(base_id: &str, project_id: &str) -> String {
    let project = project_id.trim();
    let project = if project.is_empty() { "project" } else { project };
    let sanitized: String = project
        .chars()
        .map(|c| match c {
            '/' | '\\' | ' ' => '_',
            other => other,
        })
        .collect();
    format!("{base_id}::{sanitized}")
}
