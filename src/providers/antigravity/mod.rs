pub mod oauth;

/// Provider tag stamped on antigravity credentials.
pub const ANTIGRAVITY_PROVIDER: &str = "antigravity";

/// User agent for OAuth/token traffic.
pub(crate) const ANTIGRAVITY_USER_AGENT: &str = "antigravity/1.15.8 (Windows; AMD64)";

/// Headers expected by Cloud Code's `loadCodeAssist`.
pub(crate) const CODE_ASSIST_USER_AGENT: &str = "google-api-nodejs-client/9.15.1";
pub(crate) const CODE_ASSIST_API_CLIENT: &str = "google-cloud-sdk vscode_cloudshelleditor/0.1";
