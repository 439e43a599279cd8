//! Interactive OAuth acquisition through a loopback callback listener.

mod antigravity;
mod callback;
mod presenter;

pub use antigravity::{AntigravityAuthenticator, sanitize_file_name};
pub use callback::CallbackResult;
pub use presenter::{ConsentPresenter, ConsentRequest, SystemPresenter};

use crate::auth::Auth;
use crate::config::Config;
use crate::error::LoginError;
use base64::Engine as _;
use rand::TryRngCore;
use rand::rngs::OsRng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Caller-supplied knobs for one login attempt.
#[derive(Debug, Clone, Default)]
pub struct LoginOptions {
    /// Never try to launch a browser; print the URL and tunnel instructions instead.
    pub no_browser: bool,
    /// Aborts the attempt (including in-flight HTTP calls) when cancelled.
    pub cancel: Option<CancellationToken>,
}

/// A provider that can mint a fresh credential interactively.
pub trait Authenticator {
    fn provider(&self) -> &'static str;

    /// How long before expiry the refresher should renew tokens minted by this provider.
    fn refresh_lead(&self) -> Option<Duration>;

    fn login(
        &self,
        cfg: &Config,
        opts: &LoginOptions,
    ) -> impl Future<Output = Result<Auth, LoginError>> + Send;
}

/// 128-bit anti-forgery state from the OS RNG, base64url encoded.
pub(crate) fn generate_state() -> Result<String, rand::rand_core::OsError> {
    let mut bytes = [0u8; 16];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}
