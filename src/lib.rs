pub mod auth;
pub mod config;
pub mod error;
pub mod login;
pub mod providers;
pub mod synthesizer;
pub mod utils;

mod oauth_utils;

pub use auth::{Auth, AuthStatus};
pub use config::Config;
pub use error::{CredentialError, LoginError, OauthError};
pub use login::{AntigravityAuthenticator, Authenticator, LoginOptions};
pub use synthesizer::{FileSynthesizer, SynthesisContext};
