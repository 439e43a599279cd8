use super::PROJECT_DISCOVERY_RETRY;
use crate::config::AntigravityResolvedConfig;
use crate::error::{IsRetryable, OauthError};
use crate::providers::antigravity::{CODE_ASSIST_API_CLIENT, CODE_ASSIST_USER_AGENT};
use crate::utils::logging::with_pretty_json_debug;
use backon::Retryable;
use pollux_auth_schema::{ClientMetadata, LoadCodeAssistRequest, LoadCodeAssistResponse};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Stateless operations layer for Antigravity project discovery.
///
/// Every call is a read against `loadCodeAssist` and is safe to repeat.
pub struct AntigravityOauthOps;

impl AntigravityOauthOps {
    fn load_code_assist_url(cfg: &AntigravityResolvedConfig) -> String {
        format!(
            "{}/v1internal:loadCodeAssist",
            cfg.api_url.as_str().trim_end_matches('/')
        )
    }

    /// Raw `loadCodeAssist` call.
    pub async fn load_code_assist(
        cfg: &AntigravityResolvedConfig,
        access_token: impl AsRef<str>,
        http_client: &reqwest::Client,
    ) -> Result<Value, OauthError> {
        let metadata = ClientMetadata::default();
        let resp = http_client
            .post(Self::load_code_assist_url(cfg))
            .bearer_auth(access_token.as_ref())
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, CODE_ASSIST_USER_AGENT)
            .header("X-Goog-Api-Client", CODE_ASSIST_API_CLIENT)
            .header("Client-Metadata", metadata.header_value())
            .json(&LoadCodeAssistRequest { metadata })
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(OauthError::upstream(status, &body));
        }

        let value: Value = serde_json::from_str(&body).map_err(|e| OauthError::decode(&e, &body))?;
        with_pretty_json_debug(&value, |pretty| {
            debug!(body = %pretty, "loadCodeAssist upstream body");
        });
        Ok(value)
    }

    /// Resolve the account's default companion project.
    ///
    /// Accepts `cloudaicompanionProject` either as a string or as an object with an `id`.
    pub async fn fetch_project_id(
        cfg: &AntigravityResolvedConfig,
        access_token: impl AsRef<str>,
        http_client: &reqwest::Client,
    ) -> Result<String, OauthError> {
        let value = Self::load_code_assist(cfg, access_token, http_client).await?;
        project_id_from_value(value)
    }

    /// [`Self::fetch_project_id`] with network-aware retries.
    pub async fn fetch_project_id_with_retry(
        cfg: &AntigravityResolvedConfig,
        access_token: impl AsRef<str>,
        http_client: &reqwest::Client,
    ) -> Result<String, OauthError> {
        let retry_policy = *PROJECT_DISCOVERY_RETRY;
        (|| async { Self::fetch_project_id(cfg, access_token.as_ref(), http_client).await })
            .retry(retry_policy)
            .when(|e: &OauthError| e.is_retryable())
            .notify(|err, dur: Duration| {
                warn!(
                    "antigravity loadCodeAssist retrying after error {}, sleeping {:?}",
                    err, dur
                );
            })
            .await
    }
}

fn project_id_from_value(value: Value) -> Result<String, OauthError> {
    let body = value.to_string();
    let resp: LoadCodeAssistResponse =
        serde_json::from_value(value).map_err(|e| OauthError::decode(&e, &body))?;
    resp.project_id()
        .map(str::to_string)
        .ok_or(OauthError::MissingProject)
}
