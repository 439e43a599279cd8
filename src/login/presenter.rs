use tracing::{info, warn};
use url::Url;

/// What the user needs to complete consent.
#[derive(Debug, Clone, Copy)]
pub struct ConsentRequest<'a> {
    pub provider: &'static str,
    pub auth_url: &'a Url,
    pub callback_port: u16,
    pub headless: bool,
}

/// Shows the consent URL to the user and narrates progress.
///
/// Presentation never fails a login: implementations log their own problems and fall back
/// to printing instructions.
pub trait ConsentPresenter: Send + Sync {
    fn present(&self, request: &ConsentRequest<'_>);

    fn waiting(&self, _provider: &str) {}

    fn succeeded(&self, _provider: &str, _project_id: Option<&str>) {}
}

/// Opens the system browser when possible, otherwise prints the URL and tunnel instructions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPresenter;

impl ConsentPresenter for SystemPresenter {
    fn present(&self, request: &ConsentRequest<'_>) {
        if request.headless {
            print_manual_instructions(request);
            return;
        }

        println!("Opening browser for {} authentication", request.provider);
        if !browser_available() {
            warn!("No browser available; please open the URL manually");
            print_manual_instructions(request);
        } else if let Err(e) = open::that(request.auth_url.as_str()) {
            warn!(error = %e, "Failed to open browser automatically");
            print_manual_instructions(request);
        } else {
            info!(provider = request.provider, "browser opened for consent");
        }
    }

    fn waiting(&self, provider: &str) {
        println!("Waiting for {provider} authentication callback...");
    }

    fn succeeded(&self, provider: &str, project_id: Option<&str>) {
        println!("{provider} authentication successful");
        if let Some(project_id) = project_id {
            println!("Using GCP project: {project_id}");
        }
    }
}

fn print_manual_instructions(request: &ConsentRequest<'_>) {
    let port = request.callback_port;
    println!(
        "If this machine is remote, forward the callback port from your local machine first:\n  \
         ssh -L {port}:localhost:{port} <user>@<remote-host>"
    );
    println!(
        "Visit the following URL to continue authentication:\n{}",
        request.auth_url
    );
}

/// Best-effort check for a launchable browser.
fn browser_available() -> bool {
    if cfg!(any(target_os = "macos", target_os = "windows")) {
        return true;
    }
    ["BROWSER", "DISPLAY", "WAYLAND_DISPLAY"]
        .iter()
        .any(|key| std::env::var_os(key).is_some_and(|v| !v.is_empty()))
}
