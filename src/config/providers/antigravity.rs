use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use super::ProviderDefaults;

/// Antigravity provider configuration managed by Figment.
///
/// Notes:
/// - `proxy` overrides `providers.defaults.proxy` for login traffic, and is also the fallback
///   proxy stamped onto stored antigravity credentials that carry no `proxy_url` of their own.
/// - OAuth endpoints, client credentials and the loopback callback settings are fixed to
///   built-in defaults (not configurable via `config.toml`).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AntigravityConfig {
    /// Base API URL used for project discovery (`loadCodeAssist`).
    /// TOML: `providers.antigravity.api_url`.
    /// Default: `https://cloudcode-pa.googleapis.com`.
    #[serde(default = "default_api_url")]
    pub api_url: Url,

    /// Optional upstream HTTP proxy. If set, used for reqwest clients.
    /// TOML: `providers.antigravity.proxy`. Example: `http://127.0.0.1:1080`.
    /// Falls back to `providers.defaults.proxy` when unset.
    #[serde(default)]
    pub proxy: Option<Url>,

    /// Allow HTTP/2 multiplexing for reqwest clients; disabled forces HTTP/1.
    /// TOML: `providers.antigravity.enable_multiplexing`.
    /// Falls back to `providers.defaults.enable_multiplexing`.
    #[serde(default)]
    pub enable_multiplexing: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct AntigravityResolvedConfig {
    pub api_url: Url,
    pub proxy: Option<Url>,
    /// True when `proxy` came from the provider-level override rather than global defaults.
    pub proxy_overridden: bool,
    pub enable_multiplexing: bool,
    pub oauth_auth_url: Url,
    pub oauth_token_url: Url,
    pub oauth_userinfo_url: Url,
    pub oauth_client_id: String,
    pub oauth_client_secret: String,
    pub oauth_scopes: Vec<String>,
    pub callback_port: u16,
    pub callback_path: String,
    pub callback_timeout: Duration,
    pub callback_shutdown_grace: Duration,
}

impl AntigravityConfig {
    pub fn resolve(&self, defaults: &ProviderDefaults) -> AntigravityResolvedConfig {
        AntigravityResolvedConfig {
            api_url: self.api_url.clone(),
            proxy: self.proxy.clone().or_else(|| defaults.proxy.clone()),
            proxy_overridden: self.proxy.is_some(),
            enable_multiplexing: self
                .enable_multiplexing
                .unwrap_or(defaults.enable_multiplexing),
            oauth_auth_url: default_oauth_auth_url(),
            oauth_token_url: default_oauth_token_url(),
            oauth_userinfo_url: default_oauth_userinfo_url(),
            oauth_client_id: default_oauth_client_id(),
            oauth_client_secret: default_oauth_client_secret(),
            oauth_scopes: default_oauth_scopes(),
            callback_port: ANTIGRAVITY_CALLBACK_PORT,
            callback_path: ANTIGRAVITY_CALLBACK_PATH.to_string(),
            callback_timeout: Duration::from_secs(5 * 60),
            callback_shutdown_grace: Duration::from_secs(2),
        }
    }
}

impl Default for AntigravityConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            proxy: None,
            enable_multiplexing: None,
        }
    }
}

/// Loopback port pre-registered for the antigravity OAuth client.
const ANTIGRAVITY_CALLBACK_PORT: u16 = 51121;
const ANTIGRAVITY_CALLBACK_PATH: &str = "/oauth-callback";

fn default_api_url() -> Url {
    Url::parse("https://cloudcode-pa.googleapis.com")
        .expect("default antigravity api_url must be a valid URL")
}

fn default_oauth_auth_url() -> Url {
    Url::parse("https://accounts.google.com/o/oauth2/v2/auth")
        .expect("default oauth_auth_url must be a valid URL")
}

fn default_oauth_token_url() -> Url {
    Url::parse("https://oauth2.googleapis.com/token")
        .expect("default oauth_token_url must be a valid URL")
}

fn default_oauth_userinfo_url() -> Url {
    Url::parse("https://www.googleapis.com/oauth2/v1/userinfo?alt=json")
        .expect("default oauth_userinfo_url must be a valid URL")
}

fn default_oauth_client_id() -> String {
    "1071006060591-tmhssin2h21lcre235vtolojh4g403ep.apps.googleusercontent.com".to_string()
}

fn default_oauth_client_secret() -> String {
    "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".to_string()
}

fn default_oauth_scopes() -> Vec<String> {
    vec![
        "https://www.googleapis.com/auth/cloud-platform".to_string(),
        "https://www.googleapis.com/auth/userinfo.email".to_string(),
        "https://www.googleapis.com/auth/userinfo.profile".to_string(),
        "https://www.googleapis.com/auth/cclog".to_string(),
        "https://www.googleapis.com/auth/experimentsandconfigs".to_string(),
    ]
}
