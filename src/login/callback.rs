use axum::{
    Router,
    extract::{Query, State},
    response::Html,
    routing::get,
};
use std::{
    io,
    net::{Ipv6Addr, SocketAddr},
    time::Duration,
};
use tokio::{net::TcpListener, sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const SUCCESS_PAGE: &str = "<h1>Login successful</h1><p>You can close this window.</p>";
const FAILURE_PAGE: &str = "<h1>Login failed</h1><p>Please check the CLI output.</p>";

/// Query parameters delivered by the provider's redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackResult {
    pub code: String,
    pub error: String,
    pub state: String,
}

impl CallbackResult {
    /// First occurrence of each parameter wins; repeated keys never reject the redirect.
    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.trim().to_string())
                .unwrap_or_default()
        };
        Self {
            code: first("code"),
            error: first("error"),
            state: first("state"),
        }
    }
}

pub(crate) enum CallbackOutcome {
    Received(CallbackResult),
    TimedOut,
    Closed,
}

/// Loopback HTTP listener that hands the first redirect it sees to the waiting flow.
///
/// Serves `addr` and, when it is an IPv4 loopback address, the IPv6 loopback on the same port
/// as well, so a `localhost` redirect resolving to `::1` still lands. Release goes through
/// [`CallbackServer::shutdown`]; dropping the server without it (for example when the login
/// future is cancelled) still stops the listeners, just without the grace period.
pub(crate) struct CallbackServer {
    port: u16,
    results: mpsc::Receiver<CallbackResult>,
    stop: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
    grace: Duration,
}

impl CallbackServer {
    pub(crate) async fn bind(addr: SocketAddr, path: &str, grace: Duration) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let port = listener.local_addr()?.port();

        let mut listeners = vec![listener];
        if addr.ip().is_loopback() && addr.is_ipv4() {
            match TcpListener::bind((Ipv6Addr::LOCALHOST, port)).await {
                Ok(v6) => listeners.push(v6),
                Err(e) => debug!(port, error = %e, "ipv6 loopback unavailable for oauth callback"),
            }
        }

        // Capacity 1: the first redirect wins, repeats are dropped by `try_send`.
        let (tx, results) = mpsc::channel::<CallbackResult>(1);
        let stop = CancellationToken::new();
        let app = Router::new()
            .route(path, get(handle_callback))
            .with_state(tx);

        let tasks = listeners
            .into_iter()
            .map(|listener| {
                let app = app.clone();
                let stop = stop.clone();
                tokio::spawn(async move {
                    let serve = axum::serve(listener, app)
                        .with_graceful_shutdown(async move { stop.cancelled().await });
                    if let Err(e) = serve.await {
                        warn!(error = %e, "oauth callback server error");
                    }
                })
            })
            .collect();
        debug!(port, path, "oauth callback server listening");

        Ok(Self {
            port,
            results,
            stop,
            tasks,
            grace,
        })
    }

    pub(crate) fn port(&self) -> u16 {
        self.port
    }

    pub(crate) async fn wait_for_callback(&mut self, timeout: Duration) -> CallbackOutcome {
        match tokio::time::timeout(timeout, self.results.recv()).await {
            Ok(Some(result)) => CallbackOutcome::Received(result),
            Ok(None) => CallbackOutcome::Closed,
            Err(_) => CallbackOutcome::TimedOut,
        }
    }

    /// Stop accepting, let in-flight responses flush for the grace period, then force-close.
    pub(crate) async fn shutdown(mut self) {
        self.stop.cancel();
        let deadline = tokio::time::Instant::now() + self.grace;
        for mut task in std::mem::take(&mut self.tasks) {
            if tokio::time::timeout_at(deadline, &mut task).await.is_err() {
                task.abort();
                let _ = task.await;
            }
        }
        debug!(port = self.port, "oauth callback server stopped");
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        self.stop.cancel();
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

async fn handle_callback(
    State(tx): State<mpsc::Sender<CallbackResult>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Html<&'static str> {
    let result = CallbackResult::from_pairs(pairs);
    let succeeded = !result.code.is_empty() && result.error.is_empty();
    if tx.try_send(result).is_err() {
        debug!("oauth callback already delivered; ignoring repeat redirect");
    }
    if succeeded {
        Html(SUCCESS_PAGE)
    } else {
        Html(FAILURE_PAGE)
    }
}
