use super::SynthesisContext;
use super::exclusion::{ModelExclusionHook, NoopExclusionHook};
use super::gemini_virtual::synthesize_gemini_virtual_auths;
use crate::auth::{Auth, AuthStatus, attr};
use crate::config::proxy_url_string;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

const GEMINI_CLI_PROVIDER: &str = "gemini-cli";
const ANTIGRAVITY_PROVIDER: &str = "antigravity";
const AUTH_KIND_OAUTH: &str = "oauth";

/// Generates [`Auth`] records from the OAuth JSON files in an auth directory.
///
/// Multi-project gemini credentials are fanned out into a disabled primary plus one virtual
/// record per project.
#[derive(Clone)]
pub struct FileSynthesizer {
    exclusion: Arc<dyn ModelExclusionHook>,
}

impl Default for FileSynthesizer {
    fn default() -> Self {
        Self::new(Arc::new(NoopExclusionHook))
    }
}

impl FileSynthesizer {
    pub fn new(exclusion: Arc<dyn ModelExclusionHook>) -> Self {
        Self { exclusion }
    }

    /// Synthesize records for every usable credential file.
    ///
    /// A missing or unreadable directory yields an empty list; bad files are skipped.
    pub fn synthesize(&self, ctx: &SynthesisContext<'_>) -> Vec<Auth> {
        let mut out = Vec::with_capacity(16);
        if ctx.auth_dir.as_os_str().is_empty() {
            return out;
        }

        let entries = match fs::read_dir(&ctx.auth_dir) {
            Ok(entries) => entries,
            Err(e) => {
                info!(path = %ctx.auth_dir.display(), error = %e, "auth directory unavailable; nothing to synthesize");
                return out;
            }
        };

        let mut paths: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(e) => Some(e.path()),
                Err(e) => {
                    warn!(error = %e, "failed to read auth dir entry");
                    None
                }
            })
            .filter(|path| path.is_file() && is_json_file(path))
            .collect();
        paths.sort();

        for full in paths {
            let Some(metadata) = read_metadata(&full) else {
                continue;
            };
            let Some(mut auth) = self.build_primary(ctx, &full, metadata) else {
                continue;
            };
            self.exclusion
                .apply(&mut auth, ctx.config, AUTH_KIND_OAUTH);

            if auth.provider == GEMINI_CLI_PROVIDER {
                let metadata = auth.metadata.clone();
                let mut virtuals = synthesize_gemini_virtual_auths(&mut auth, &metadata);
                if !virtuals.is_empty() {
                    for v in &mut virtuals {
                        self.exclusion.apply(v, ctx.config, AUTH_KIND_OAUTH);
                    }
                    debug!(
                        id = %auth.id,
                        projects = virtuals.len(),
                        "split multi-project gemini credential"
                    );
                    out.push(auth);
                    out.extend(virtuals);
                    continue;
                }
            }
            out.push(auth);
        }
        out
    }

    fn build_primary(
        &self,
        ctx: &SynthesisContext<'_>,
        full: &Path,
        metadata: Map<String, Value>,
    ) -> Option<Auth> {
        let Some(kind) = metadata
            .get("type")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
        else {
            debug!(path = %full.display(), "credential file has no type; skipping");
            return None;
        };
        let provider = normalize_provider(kind);

        let label = metadata
            .get("email")
            .and_then(Value::as_str)
            .filter(|e| !e.is_empty())
            .map_or_else(|| provider.clone(), str::to_string);

        // Relative path under the auth dir matches the file-based token store's ids.
        let id = full
            .strip_prefix(&ctx.auth_dir)
            .ok()
            .map(|rel| rel.to_string_lossy().into_owned())
            .filter(|rel| !rel.is_empty())
            .unwrap_or_else(|| full.to_string_lossy().into_owned());

        let mut proxy_url = metadata
            .get("proxy_url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .filter(|p| !p.is_empty());
        if provider == ANTIGRAVITY_PROVIDER && proxy_url.is_none() {
            proxy_url = ctx
                .config
                .antigravity_proxy_override()
                .map(proxy_url_string)
                .filter(|p| !p.is_empty());
        }

        let prefix = metadata
            .get("prefix")
            .and_then(Value::as_str)
            .and_then(sanitize_prefix);

        let full_display = full.to_string_lossy().into_owned();
        let attributes = HashMap::from([
            (attr::SOURCE.to_string(), full_display.clone()),
            (attr::PATH.to_string(), full_display),
        ]);

        Some(Auth {
            id,
            provider,
            file_name: None,
            label,
            prefix,
            status: AuthStatus::Active,
            disabled: false,
            attributes,
            metadata,
            proxy_url,
            runtime: None,
            created_at: ctx.now,
            updated_at: ctx.now,
        })
    }
}

/// Lowercase the declared type; stored `gemini` credentials belong to `gemini-cli`.
pub(crate) fn normalize_provider(kind: &str) -> String {
    let provider = kind.to_lowercase();
    if provider == "gemini" {
        GEMINI_CLI_PROVIDER.to_string()
    } else {
        provider
    }
}

/// A routing prefix is a single path segment; anything else is treated as absent.
pub(crate) fn sanitize_prefix(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('/');
    (!trimmed.is_empty() && !trimmed.contains('/')).then(|| trimmed.to_string())
}

fn is_json_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        == Some(true)
}

fn read_metadata(path: &Path) -> Option<Map<String, Value>> {
    let data = match fs::read(path) {
        Ok(data) if !data.is_empty() => data,
        Ok(_) => {
            debug!(path = %path.display(), "empty credential file; skipping");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read credential file");
            return None;
        }
    };
    match serde_json::from_slice::<Value>(&data) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            warn!(path = %path.display(), "credential JSON is not an object");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "invalid credential JSON");
            None
        }
    }
}
