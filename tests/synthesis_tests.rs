use chrono::{TimeZone, Utc};
use pollux_auth::{
    Auth, AuthStatus, Config, FileSynthesizer, SynthesisContext,
    auth::attr,
    synthesizer::ModelExclusionHook,
};
use serde_json::{Value, json};
use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex},
};
use url::Url;

fn write_json(dir: &Path, name: &str, value: &Value) {
    fs::write(dir.join(name), serde_json::to_vec_pretty(value).unwrap()).expect("write cred");
}

fn synthesize(dir: &Path, cfg: &Config) -> Vec<Auth> {
    let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
    FileSynthesizer::default().synthesize(&SynthesisContext::new(dir, cfg, now))
}

#[test]
fn skips_malformed_files_and_keeps_valid_ones() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        dir.path(),
        "provider-x.json",
        &json!({ "type": "foo", "email": "x@example.com", "access_token": "t" }),
    );
    fs::write(dir.path().join("bad.json"), b"{ not json").unwrap();
    fs::write(dir.path().join("empty.json"), b"").unwrap();
    fs::write(dir.path().join("array.json"), b"[1, 2]").unwrap();
    write_json(dir.path(), "untyped.json", &json!({ "email": "u@example.com" }));
    write_json(dir.path(), "notes.txt", &json!({ "type": "foo" }));
    fs::create_dir(dir.path().join("nested.json")).unwrap();

    let auths = synthesize(dir.path(), &Config::default());
    assert_eq!(auths.len(), 1);

    let auth = &auths[0];
    assert_eq!(auth.id, "provider-x.json");
    assert_eq!(auth.provider, "foo");
    assert_eq!(auth.label, "x@example.com");
    assert_eq!(auth.status, AuthStatus::Active);
    assert!(!auth.disabled);
    assert!(auth.runtime.is_none());
    let full = dir.path().join("provider-x.json");
    assert_eq!(auth.attribute(attr::SOURCE), Some(full.to_str().unwrap()));
    assert_eq!(auth.attribute(attr::PATH), Some(full.to_str().unwrap()));
    assert_eq!(auth.metadata["access_token"], "t");
    assert_eq!(auth.created_at, Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap());
    assert_eq!(auth.updated_at, auth.created_at);
}

#[test]
fn missing_or_empty_directory_yields_nothing() {
    let dir = tempfile::tempdir().unwrap();
    assert!(synthesize(&dir.path().join("absent"), &Config::default()).is_empty());
    assert!(synthesize(dir.path(), &Config::default()).is_empty());
    assert!(synthesize(Path::new(""), &Config::default()).is_empty());
}

#[test]
fn label_falls_back_to_provider_and_gemini_is_normalized() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "g.json", &json!({ "type": "Gemini", "project_id": "p1" }));

    let auths = synthesize(dir.path(), &Config::default());
    assert_eq!(auths.len(), 1);
    assert_eq!(auths[0].provider, "gemini-cli");
    assert_eq!(auths[0].label, "gemini-cli");
    assert!(!auths[0].disabled);
}

#[test]
fn prefix_is_kept_only_when_single_segment() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "a.json", &json!({ "type": "foo", "prefix": " /team/ " }));
    write_json(dir.path(), "b.json", &json!({ "type": "foo", "prefix": "a/b" }));
    write_json(dir.path(), "c.json", &json!({ "type": "foo", "prefix": "   " }));

    let auths = synthesize(dir.path(), &Config::default());
    let prefixes: Vec<Option<&str>> = auths.iter().map(|a| a.prefix.as_deref()).collect();
    assert_eq!(prefixes, vec![Some("team"), None, None]);
}

#[test]
fn multi_project_gemini_credential_is_split() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        dir.path(),
        "gemini-a.json",
        &json!({
            "type": "gemini",
            "email": "a@example.com",
            "project_id": "p1, p1 ,p2",
            "proxy_url": "http://proxy:8080",
            "prefix": "team",
            "token": { "access_token": "at", "refresh_token": "rt" }
        }),
    );

    let auths = synthesize(dir.path(), &Config::default());
    assert_eq!(auths.len(), 3);

    let primary = &auths[0];
    assert_eq!(primary.id, "gemini-a.json");
    assert!(primary.disabled);
    assert_eq!(primary.status, AuthStatus::Disabled);
    assert!(!primary.is_selectable());
    assert_eq!(primary.attribute(attr::VIRTUAL_PRIMARY), Some("true"));
    assert_eq!(primary.attribute(attr::VIRTUAL_CHILDREN), Some("p1,p2"));
    let shared = primary
        .runtime
        .as_ref()
        .and_then(|r| r.as_shared())
        .expect("primary owns shared credential");
    assert_eq!(shared.project_ids(), ["p1".to_string(), "p2".to_string()]);
    assert_eq!(shared.email(), "a@example.com");

    for (v, project) in auths[1..].iter().zip(["p1", "p2"]) {
        assert_eq!(v.id, format!("gemini-a.json::{project}"));
        assert_eq!(v.provider, "gemini-cli");
        assert_eq!(v.label, format!("a@example.com [{project}]"));
        assert_eq!(v.prefix.as_deref(), Some("team"));
        assert_eq!(v.proxy_url.as_deref(), Some("http://proxy:8080"));
        assert_eq!(v.status, AuthStatus::Active);
        assert!(v.is_virtual());
        assert!(v.is_selectable());
        assert!(v.file_name.is_none());
        assert_eq!(v.attribute(attr::RUNTIME_ONLY), Some("true"));
        assert_eq!(v.attribute(attr::VIRTUAL_PARENT), Some("gemini-a.json"));
        assert_eq!(v.attribute(attr::VIRTUAL_PROJECT), Some(project));
        assert_eq!(v.attribute(attr::SOURCE), primary.attribute(attr::SOURCE));
        assert_eq!(v.created_at, primary.created_at);

        assert_eq!(
            v.metadata,
            json!({
                "email": "a@example.com",
                "project_id": project,
                "virtual": true,
                "virtual_parent_id": "gemini-a.json",
                "type": "gemini",
                "proxy_url": "http://proxy:8080"
            })
            .as_object()
            .unwrap()
            .clone()
        );

        let runtime = v.runtime.as_ref().and_then(|r| r.as_virtual()).expect("virtual runtime");
        assert_eq!(runtime.project_id(), project);
        assert_eq!(runtime.access_token().unwrap(), "at");
    }

    // Virtuals see refreshed tokens written through the shared credential.
    let mut update = serde_json::Map::new();
    update.insert("access_token".into(), json!("at-2"));
    shared.apply_refresh(&update);
    let v1 = auths[1].runtime.as_ref().and_then(|r| r.as_virtual()).unwrap();
    assert_eq!(v1.access_token().unwrap(), "at-2");
}

#[test]
fn virtual_loses_token_once_primary_is_dropped() {
    let dir = tempfile::tempdir().unwrap();
    write_json(
        dir.path(),
        "g.json",
        &json!({ "type": "gemini", "project_id": "p1,p2", "access_token": "at" }),
    );

    let mut auths = synthesize(dir.path(), &Config::default());
    let virtual_auth = auths.pop().unwrap();
    drop(auths);

    let runtime = virtual_auth.runtime.as_ref().and_then(|r| r.as_virtual()).unwrap();
    assert!(matches!(
        runtime.access_token(),
        Err(pollux_auth::CredentialError::ParentReleased { .. })
    ));
}

#[test]
fn repeated_synthesis_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "z.json", &json!({ "type": "foo" }));
    write_json(dir.path(), "a.json", &json!({ "type": "gemini", "project_id": "x y,q/r" }));

    let ids = |auths: Vec<Auth>| auths.into_iter().map(|a| a.id).collect::<Vec<_>>();
    let first = ids(synthesize(dir.path(), &Config::default()));
    let second = ids(synthesize(dir.path(), &Config::default()));
    assert_eq!(first, second);
    assert_eq!(first, vec!["a.json", "a.json::x_y", "a.json::q_r", "z.json"]);
}

#[test]
fn antigravity_inherits_provider_proxy_override() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "ag.json", &json!({ "type": "antigravity" }));
    write_json(
        dir.path(),
        "ag-own.json",
        &json!({ "type": "antigravity", "proxy_url": "http://own:1" }),
    );
    write_json(dir.path(), "other.json", &json!({ "type": "foo" }));

    let mut cfg = Config::default();
    cfg.providers.defaults.proxy = Some(Url::parse("http://global:9").unwrap());
    let auths = synthesize(dir.path(), &cfg);
    assert!(auths.iter().find(|a| a.id == "ag.json").unwrap().proxy_url.is_none());

    cfg.providers.antigravity.proxy = Some(Url::parse("socks5://ag:1080").unwrap());
    let auths = synthesize(dir.path(), &cfg);
    let by_id = |id: &str| auths.iter().find(|a| a.id == id).unwrap();
    assert_eq!(by_id("ag.json").proxy_url.as_deref(), Some("socks5://ag:1080"));
    assert_eq!(by_id("ag-own.json").proxy_url.as_deref(), Some("http://own:1"));
    assert!(by_id("other.json").proxy_url.is_none());

    cfg.providers.antigravity.proxy = Some(Url::parse("http://ag-http:8080").unwrap());
    let auths = synthesize(dir.path(), &cfg);
    let ag = auths.iter().find(|a| a.id == "ag.json").unwrap();
    assert_eq!(ag.proxy_url.as_deref(), Some("http://ag-http:8080"));
}

#[derive(Default)]
struct RecordingHook {
    seen: Mutex<Vec<(String, String)>>,
}

impl ModelExclusionHook for RecordingHook {
    fn apply(&self, auth: &mut Auth, _config: &Config, auth_kind: &str) {
        self.seen
            .lock()
            .unwrap()
            .push((auth.id.clone(), auth_kind.to_string()));
        auth.attributes
            .insert("excluded_models".to_string(), "none".to_string());
    }
}

#[test]
fn exclusion_hook_runs_for_primary_and_virtuals() {
    let dir = tempfile::tempdir().unwrap();
    write_json(dir.path(), "g.json", &json!({ "type": "gemini", "project_id": "p1,p2" }));

    let hook = Arc::new(RecordingHook::default());
    let cfg = Config::default();
    let auths = FileSynthesizer::new(hook.clone())
        .synthesize(&SynthesisContext::new(dir.path(), &cfg, Utc::now()));

    assert_eq!(auths.len(), 3);
    assert!(auths.iter().all(|a| a.attribute("excluded_models") == Some("none")));
    let seen = hook.seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![
            ("g.json".to_string(), "oauth".to_string()),
            ("g.json::p1".to_string(), "oauth".to_string()),
            ("g.json::p2".to_string(), "oauth".to_string()),
        ]
    );
}
