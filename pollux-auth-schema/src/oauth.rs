//! Google OAuth token endpoint and userinfo payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// `authorization_code` grant response from the token endpoint.
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct TokenExchangeResponse {
    #[serde(default)]
    pub access_token: String,

    #[serde(default)]
    pub refresh_token: String,

    #[serde(default)]
    pub expires_in: i64,

    #[serde(default)]
    pub token_type: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl std::fmt::Debug for TokenExchangeResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |s: &str| if s.is_empty() { "<empty>" } else { "<redacted>" };
        f.debug_struct("TokenExchangeResponse")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .field("extra_keys", &self.extra.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Subset of the OAuth2 userinfo document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub email: Option<String>,
}

impl UserInfo {
    /// Trimmed, non-empty email.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_response_keeps_unknown_fields() {
        let resp: TokenExchangeResponse = serde_json::from_value(json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3599,
            "token_type": "Bearer",
            "id_token": "x.y.z"
        }))
        .expect("parse token response");

        assert_eq!(resp.expires_in, 3599);
        assert!(resp.extra.contains_key("id_token"));
        assert!(!format!("{resp:?}").contains("x.y.z"));
    }

    #[test]
    fn blank_email_is_absent() {
        let info: UserInfo = serde_json::from_value(json!({ "email": "  " })).unwrap();
        assert_eq!(info.email(), None);
    }
}
