use crate::config::AntigravityResolvedConfig;
use crate::error::OauthError;
use crate::oauth_utils::build_consent_url;
use oauth2::{AuthorizationCode, RedirectUrl};
use pollux_auth_schema::{TokenExchangeResponse, UserInfo};
use tracing::{debug, info};

/// Stateless Antigravity OAuth endpoints built from resolved config.
///
/// The redirect URI is per-login (it carries the bound loopback port).
pub struct AntigravityOauthEndpoints;

impl AntigravityOauthEndpoints {
    /// Build the consent URL for `redirect_uri` carrying the anti-forgery `state`.
    pub fn build_authorize_url(
        cfg: &AntigravityResolvedConfig,
        redirect_uri: &str,
        state: &str,
    ) -> Result<url::Url, url::ParseError> {
        let redirect = RedirectUrl::new(redirect_uri.to_string())?;
        build_consent_url(
            &cfg.oauth_client_id,
            cfg.oauth_auth_url.as_str(),
            redirect,
            &cfg.oauth_scopes,
            state,
        )
    }

    /// Exchange an authorization code for tokens (`authorization_code` grant).
    ///
    /// Client credentials travel in the form body alongside the code and redirect URI.
    pub async fn exchange_authorization_code(
        cfg: &AntigravityResolvedConfig,
        code: &AuthorizationCode,
        redirect_uri: &str,
        http_client: &reqwest::Client,
    ) -> Result<TokenExchangeResponse, OauthError> {
        let form = [
            ("code", code.secret().as_str()),
            ("client_id", cfg.oauth_client_id.as_str()),
            ("client_secret", cfg.oauth_client_secret.as_str()),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let resp = http_client
            .post(cfg.oauth_token_url.clone())
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(OauthError::upstream(status, &body));
        }

        let token: TokenExchangeResponse =
            serde_json::from_str(&body).map_err(|e| OauthError::decode(&e, &body))?;
        info!("Antigravity OAuth2 code exchange completed successfully");
        Ok(token)
    }

    /// Fetch the account email for `access_token`.
    ///
    /// A non-2xx answer means "no email" rather than an error.
    pub async fn fetch_user_email(
        cfg: &AntigravityResolvedConfig,
        access_token: &str,
        http_client: &reqwest::Client,
    ) -> Result<Option<String>, OauthError> {
        if access_token.trim().is_empty() {
            return Ok(None);
        }

        let resp = http_client
            .get(cfg.oauth_userinfo_url.clone())
            .bearer_auth(access_token)
            .send()
            .await?;

        if !resp.status().is_success() {
            debug!(status = %resp.status(), "userinfo returned non-success status");
            return Ok(None);
        }

        let body = resp.text().await?;
        let info: UserInfo =
            serde_json::from_str(&body).map_err(|e| OauthError::decode(&e, &body))?;
        Ok(info.email().map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::collections::HashMap;

    #[test]
    fn authorize_url_carries_offline_consent_and_state() {
        let cfg = Config::default().antigravity();
        let url = AntigravityOauthEndpoints::build_authorize_url(
            &cfg,
            "http://localhost:51121/oauth-callback",
            "state-123",
        )
        .expect("valid authorize url");

        assert!(url.as_str().starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        let q: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(q.get("access_type").map(String::as_str), Some("offline"));
        assert_eq!(q.get("prompt").map(String::as_str), Some("consent"));
        assert_eq!(q.get("response_type").map(String::as_str), Some("code"));
        assert_eq!(q.get("state").map(String::as_str), Some("state-123"));
        assert_eq!(
            q.get("redirect_uri").map(String::as_str),
            Some("http://localhost:51121/oauth-callback")
        );
        assert_eq!(q.get("client_id"), Some(&cfg.oauth_client_id));
        let scopes: Vec<&str> = q["scope"].split(' ').collect();
        assert_eq!(scopes.len(), cfg.oauth_scopes.len());
        assert!(scopes.contains(&"https://www.googleapis.com/auth/cclog"));
    }
}
