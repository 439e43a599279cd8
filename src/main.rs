use chrono::Utc;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use pollux_auth::{
    AntigravityAuthenticator, Authenticator, Config, FileSynthesizer, LoginOptions,
    SynthesisContext, utils::logging::init_tracing,
};
use std::path::PathBuf;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Parser)]
#[command(name = "pollux-auth", version, about = "Credential login and auth-dir synthesis")]
struct Cli {
    /// Path to the TOML config file (defaults merged underneath). Defaults to `./config.toml`.
    #[arg(long, short)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the interactive antigravity OAuth login and print the credential record.
    Login {
        /// Print the consent URL instead of opening a browser.
        #[arg(long)]
        no_browser: bool,
    },
    /// Synthesize auth records from the credential files in a directory.
    Scan {
        /// Overrides `basic.auth_dir`.
        #[arg(long)]
        auth_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = match cli.config.as_deref() {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::from_optional_toml()?,
    };
    init_tracing(&cfg.basic.loglevel);

    info!(
        config = %cli.config.as_deref().map_or("config.toml".into(), |p| p.display().to_string()),
        loglevel = %cfg.basic.loglevel,
        proxy = %cfg.antigravity().proxy.as_ref().map_or("<none>", |u| u.as_str()),
    );

    match cli.command {
        Command::Login { no_browser } => login(&cfg, no_browser).await,
        Command::Scan { auth_dir } => {
            scan(&cfg, auth_dir);
            Ok(())
        }
    }
}

async fn login(cfg: &Config, no_browser: bool) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            return;
        }
        on_signal.cancel();
    });

    let authenticator = AntigravityAuthenticator::new();
    let opts = LoginOptions {
        no_browser,
        cancel: Some(cancel),
    };
    let auth = authenticator.login(cfg, &opts).await?;
    info!(
        id = %auth.id,
        refresh_lead_secs = authenticator.refresh_lead().map(|d| d.as_secs()),
        "credential ready to persist"
    );
    println!("{}", serde_json::to_string_pretty(&auth)?);
    Ok(())
}

fn scan(cfg: &Config, auth_dir: Option<PathBuf>) {
    let Some(dir) = auth_dir.or_else(|| cfg.basic.auth_dir.clone()) else {
        warn!("no auth directory given (--auth-dir or basic.auth_dir)");
        return;
    };

    let ctx = SynthesisContext::new(dir, cfg, Utc::now());
    let auths = FileSynthesizer::default().synthesize(&ctx);
    info!(count = auths.len(), path = %ctx.auth_dir.display(), "synthesis finished");
    for auth in &auths {
        let state = if auth.disabled { "disabled" } else { "active" };
        let kind = if auth.is_virtual() { "virtual" } else { "file" };
        println!("{}\t{}\t{}\t{}\t{}", auth.id, auth.provider, kind, state, auth.label);
    }
}
