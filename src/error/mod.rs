mod credential;
mod login;
mod oauth;

pub use credential::CredentialError;
pub use login::LoginError;
pub use oauth::OauthError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
