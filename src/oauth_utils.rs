use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, CsrfToken, RedirectUrl, Scope};

/// Build a Google-style consent URL (`access_type=offline`, `prompt=consent`) for a fixed state.
pub(crate) fn build_consent_url(
    client_id: &str,
    auth_url: &str,
    redirect_url: RedirectUrl,
    scopes: &[String],
    state: &str,
) -> Result<url::Url, url::ParseError> {
    let client = BasicClient::new(ClientId::new(client_id.to_string()))
        .set_auth_uri(AuthUrl::new(auth_url.to_string())?)
        .set_redirect_uri(redirect_url);

    let state = state.to_string();
    let mut req = client
        .authorize_url(move || CsrfToken::new(state))
        .add_extra_param("access_type", "offline")
        .add_extra_param("prompt", "consent");

    for scope in scopes {
        req = req.add_scope(Scope::new(scope.clone()));
    }

    let (url, _csrf) = req.url();
    Ok(url)
}
