use super::oauth::OauthError;
use reqwest::StatusCode;
use thiserror::Error as ThisError;

/// Terminal failure of one interactive login attempt.
///
/// Each variant names the stage that failed; no partial credential is ever returned
/// alongside one of these.
#[derive(Debug, ThisError)]
pub enum LoginError {
    #[error("{provider}: invalid configuration: {message}")]
    Config {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: failed to generate state: {source}")]
    StateGeneration {
        provider: &'static str,
        #[source]
        source: rand::rand_core::OsError,
    },

    #[error("{provider}: failed to start callback server: {source}")]
    ServerStart {
        provider: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{provider}: authentication timed out")]
    Timeout { provider: &'static str },

    #[error("{provider}: authentication failed: {message}")]
    ProviderDenied {
        provider: &'static str,
        message: String,
    },

    #[error("{provider}: invalid state (possible forged callback)")]
    StateMismatch { provider: &'static str },

    #[error("{provider}: missing authorization code")]
    MissingCode { provider: &'static str },

    #[error("{provider}: callback server stopped before delivering a result")]
    CallbackClosed { provider: &'static str },

    #[error("{provider}: token exchange failed: {source}")]
    TokenExchange {
        provider: &'static str,
        #[source]
        source: OauthError,
    },

    #[error("{provider}: login cancelled")]
    Cancelled { provider: &'static str },
}

impl LoginError {
    /// Upstream status of a failed token exchange, when one was received.
    pub fn upstream_status(&self) -> Option<StatusCode> {
        match self {
            LoginError::TokenExchange { source, .. } => source.status(),
            _ => None,
        }
    }
}
