use super::IsRetryable;
use reqwest::StatusCode;
use thiserror::Error as ThisError;

/// Characters of an upstream error body kept for diagnostics.
const BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, ThisError)]
pub enum OauthError {
    #[error("OAuth2 request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("OAuth2 upstream error with status {status}: {body}")]
    UpstreamStatus { status: StatusCode, body: String },

    #[error("OAuth2 response decode error: {message}. Body: {body}")]
    Decode { message: String, body: String },

    #[error("no cloudaicompanionProject in response")]
    MissingProject,
}

impl OauthError {
    pub(crate) fn upstream(status: StatusCode, body: &str) -> Self {
        OauthError::UpstreamStatus {
            status,
            body: preview(body),
        }
    }

    pub(crate) fn decode(err: &serde_json::Error, body: &str) -> Self {
        OauthError::Decode {
            message: err.to_string(),
            body: preview(body),
        }
    }

    /// Upstream HTTP status, when the failure carried one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            OauthError::UpstreamStatus { status, .. } => Some(*status),
            OauthError::Request(err) => err.status(),
            _ => None,
        }
    }
}

impl IsRetryable for OauthError {
    fn is_retryable(&self) -> bool {
        match self {
            OauthError::Request(_) => true,
            OauthError::UpstreamStatus { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

fn preview(body: &str) -> String {
    let body = body.trim();
    body.char_indices()
        .nth(BODY_PREVIEW_CHARS)
        .map(|(idx, _)| format!("{}...<truncated>", &body[..idx]))
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_throttling_and_server_errors_retry() {
        assert!(OauthError::upstream(StatusCode::TOO_MANY_REQUESTS, "").is_retryable());
        assert!(OauthError::upstream(StatusCode::BAD_GATEWAY, "").is_retryable());
        assert!(!OauthError::upstream(StatusCode::FORBIDDEN, "").is_retryable());
        assert!(!OauthError::MissingProject.is_retryable());
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        match OauthError::upstream(StatusCode::BAD_REQUEST, &body) {
            OauthError::UpstreamStatus { body, status } => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert!(body.ends_with("...<truncated>"));
                assert!(body.len() < 300);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn every_variant_renders_its_stage() {
        // No wildcard arm.
        fn stage(err: &OauthError) -> &'static str {
            match err {
                OauthError::Request(_) => "request",
                OauthError::UpstreamStatus { .. } => "upstream",
                OauthError::Decode { .. } => "decode",
                OauthError::MissingProject => "project",
            }
        }
        let decode_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        for (err, needle) in [
            (OauthError::upstream(StatusCode::BAD_REQUEST, "bad"), "status 400"),
            (OauthError::decode(&decode_err, "{"), "decode error"),
            (OauthError::MissingProject, "cloudaicompanionProject"),
        ] {
            assert!(!stage(&err).is_empty());
            assert!(err.to_string().contains(needle), "{err}");
        }
    }
}
