use super::callback::{CallbackOutcome, CallbackResult, CallbackServer};
use super::presenter::{ConsentPresenter, ConsentRequest, SystemPresenter};
use super::{Authenticator, LoginOptions, generate_state};
use crate::auth::{Auth, AuthStatus};
use crate::config::{AntigravityResolvedConfig, Config, proxy_url_string};
use crate::error::LoginError;
use crate::providers::antigravity::oauth::{
    endpoints::AntigravityOauthEndpoints, ops::AntigravityOauthOps,
};
use crate::providers::antigravity::{ANTIGRAVITY_PROVIDER, ANTIGRAVITY_USER_AGENT};
use crate::providers::build_client;
use chrono::{SecondsFormat, TimeDelta, Utc};
use oauth2::AuthorizationCode;
use pollux_auth_schema::TokenExchangeResponse;
use serde_json::{Map, Value, json};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const PROVIDER: &str = ANTIGRAVITY_PROVIDER;

/// Interactive authorization-code login for the antigravity provider.
///
/// Produces exactly one credential per successful run; multi-project splitting only happens
/// later, when the stored file is synthesized again.
#[derive(Clone)]
pub struct AntigravityAuthenticator {
    presenter: Arc<dyn ConsentPresenter>,
}

impl Default for AntigravityAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

impl Authenticator for AntigravityAuthenticator {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn refresh_lead(&self) -> Option<Duration> {
        Some(Duration::from_secs(5 * 60))
    }

    async fn login(&self, cfg: &Config, opts: &LoginOptions) -> Result<Auth, LoginError> {
        self.login_with(&cfg.antigravity(), opts).await
    }
}

impl AntigravityAuthenticator {
    pub fn new() -> Self {
        Self::with_presenter(Arc::new(SystemPresenter))
    }

    pub fn with_presenter(presenter: Arc<dyn ConsentPresenter>) -> Self {
        Self { presenter }
    }

    /// Run the login against an already-resolved provider config.
    pub async fn login_with(
        &self,
        cfg: &AntigravityResolvedConfig,
        opts: &LoginOptions,
    ) -> Result<Auth, LoginError> {
        let flow = self.run(cfg, opts.no_browser);
        match opts.cancel.as_ref() {
            Some(token) => tokio::select! {
                biased;
                () = token.cancelled() => Err(LoginError::Cancelled { provider: PROVIDER }),
                res = flow => res,
            },
            None => flow.await,
        }
    }

    async fn run(
        &self,
        cfg: &AntigravityResolvedConfig,
        headless: bool,
    ) -> Result<Auth, LoginError> {
        let http_client = build_client(
            ANTIGRAVITY_USER_AGENT,
            cfg.proxy.as_ref(),
            cfg.enable_multiplexing,
        )
        .map_err(|e| LoginError::Config {
            provider: PROVIDER,
            message: format!("failed to build http client: {e}"),
        })?;

        let state = generate_state().map_err(|source| LoginError::StateGeneration {
            provider: PROVIDER,
            source,
        })?;

        let (callback, redirect_uri) = self.await_callback(cfg, &state, headless).await?;
        let code = validate_callback(callback, &state)?;

        let token = AntigravityOauthEndpoints::exchange_authorization_code(
            cfg,
            &code,
            &redirect_uri,
            &http_client,
        )
        .await
        .map_err(|source| LoginError::TokenExchange {
            provider: PROVIDER,
            source,
        })?;

        let (email, project_id) = enrich(cfg, &token, &http_client).await;

        let auth = build_auth(cfg, &token, email, project_id);
        self.presenter
            .succeeded(PROVIDER, auth.metadata_str("project_id"));
        Ok(auth)
    }

    /// Bind the loopback listener, present consent, and wait for the redirect.
    ///
    /// The listener is shut down before this returns, whatever the outcome.
    async fn await_callback(
        &self,
        cfg: &AntigravityResolvedConfig,
        state: &str,
        headless: bool,
    ) -> Result<(CallbackResult, String), LoginError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, cfg.callback_port));
        let mut server = CallbackServer::bind(addr, &cfg.callback_path, cfg.callback_shutdown_grace)
            .await
            .map_err(|source| LoginError::ServerStart {
                provider: PROVIDER,
                source,
            })?;

        let redirect_uri = format!("http://localhost:{}{}", server.port(), cfg.callback_path);
        let outcome = match AntigravityOauthEndpoints::build_authorize_url(cfg, &redirect_uri, state)
        {
            Ok(auth_url) => {
                self.presenter.present(&ConsentRequest {
                    provider: PROVIDER,
                    auth_url: &auth_url,
                    callback_port: server.port(),
                    headless,
                });
                self.presenter.waiting(PROVIDER);
                match server.wait_for_callback(cfg.callback_timeout).await {
                    CallbackOutcome::Received(result) => Ok(result),
                    CallbackOutcome::TimedOut => Err(LoginError::Timeout { provider: PROVIDER }),
                    CallbackOutcome::Closed => {
                        Err(LoginError::CallbackClosed { provider: PROVIDER })
                    }
                }
            }
            Err(e) => Err(LoginError::Config {
                provider: PROVIDER,
                message: format!("invalid authorize url: {e}"),
            }),
        };

        server.shutdown().await;
        outcome.map(|result| (result, redirect_uri))
    }
}

/// Provider error first, then state, then the code itself.
fn validate_callback(
    callback: CallbackResult,
    expected_state: &str,
) -> Result<AuthorizationCode, LoginError> {
    if !callback.error.is_empty() {
        return Err(LoginError::ProviderDenied {
            provider: PROVIDER,
            message: callback.error,
        });
    }
    if callback.state != expected_state {
        return Err(LoginError::StateMismatch { provider: PROVIDER });
    }
    if callback.code.is_empty() {
        return Err(LoginError::MissingCode { provider: PROVIDER });
    }
    Ok(AuthorizationCode::new(callback.code))
}

/// Best-effort email and default project lookup; failures only drop the field.
async fn enrich(
    cfg: &AntigravityResolvedConfig,
    token: &TokenExchangeResponse,
    http_client: &reqwest::Client,
) -> (Option<String>, Option<String>) {
    if token.access_token.is_empty() {
        return (None, None);
    }

    let email = match AntigravityOauthEndpoints::fetch_user_email(
        cfg,
        &token.access_token,
        http_client,
    )
    .await
    {
        Ok(email) => email,
        Err(e) => {
            warn!(error = %e, "antigravity: userinfo lookup failed; continuing without email");
            None
        }
    };

    let project_id = match AntigravityOauthOps::fetch_project_id_with_retry(
        cfg,
        &token.access_token,
        http_client,
    )
    .await
    {
        Ok(project_id) => {
            info!(project_id = %project_id, "antigravity: obtained project ID");
            Some(project_id)
        }
        Err(e) => {
            warn!(error = %e, "antigravity: failed to fetch project ID");
            None
        }
    };

    (email, project_id)
}

fn build_auth(
    cfg: &AntigravityResolvedConfig,
    token: &TokenExchangeResponse,
    email: Option<String>,
    project_id: Option<String>,
) -> Auth {
    let now = Utc::now();
    // Absurd lifetimes from upstream clamp to `now` instead of overflowing.
    let expired = TimeDelta::try_seconds(token.expires_in)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(now);

    let mut metadata = Map::new();
    metadata.insert("type".to_string(), json!(PROVIDER));
    metadata.insert("access_token".to_string(), json!(token.access_token));
    metadata.insert("refresh_token".to_string(), json!(token.refresh_token));
    metadata.insert("expires_in".to_string(), json!(token.expires_in));
    metadata.insert("timestamp".to_string(), json!(now.timestamp_millis()));
    metadata.insert(
        "expired".to_string(),
        json!(expired.to_rfc3339_opts(SecondsFormat::Secs, true)),
    );
    if let Some(email) = email.as_ref() {
        metadata.insert("email".to_string(), Value::String(email.clone()));
    }
    if let Some(project_id) = project_id {
        metadata.insert("project_id".to_string(), Value::String(project_id));
    }
    // Only a provider-level proxy is pinned to the credential; a global one stays global.
    let proxy_url = cfg
        .proxy
        .as_ref()
        .filter(|_| cfg.proxy_overridden)
        .map(proxy_url_string);
    if let Some(proxy) = proxy_url.as_ref() {
        metadata.insert("proxy_url".to_string(), Value::String(proxy.clone()));
    }

    let file_name = sanitize_file_name(email.as_deref());
    Auth {
        id: file_name.clone(),
        provider: PROVIDER.to_string(),
        file_name: Some(file_name),
        label: email.unwrap_or_else(|| PROVIDER.to_string()),
        status: AuthStatus::Unknown,
        metadata,
        proxy_url,
        created_at: now,
        updated_at: now,
        ..Default::default()
    }
}

/// File-safe storage name derived from the account email.
pub fn sanitize_file_name(email: Option<&str>) -> String {
    match email.map(str::trim).filter(|e| !e.is_empty()) {
        Some(email) => format!("{PROVIDER}-{}.json", email.replace(['@', '.'], "_")),
        None => format!("{PROVIDER}.json"),
    }
}
