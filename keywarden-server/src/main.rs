//! KeyWarden license verification server.
//!
//! Usage:
//!   keywarden-server --port 8080 --db keywarden.db
//!
//! Verifies license keys against their bound network origin and escalates a
//! lockout when a key is shared across origins. Provisioning is enabled by
//! passing `--admin-secret`; mismatch alerts by passing `--notify-url`.

use anyhow::{Context, Result};
use clap::Parser;
use keywarden_notify::{NoopNotifier, Notifier, WebhookNotifier};
use keywarden_server::{build_router, AppState, VerificationService};
use keywarden_store::{LicenseStore, SqliteLicenseStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "keywarden-server")]
#[command(about = "KeyWarden license verification server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Path to the license database
    #[arg(long, default_value = "keywarden.db")]
    db: PathBuf,

    /// Secret required by the provisioning endpoint; omitting it disables
    /// provisioning
    #[arg(long)]
    admin_secret: Option<String>,

    /// Endpoint for mismatch alert reports; omitting it drops alerts
    #[arg(long)]
    notify_url: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("KeyWarden server starting...");

    let store = SqliteLicenseStore::new(&args.db)
        .with_context(|| format!("failed to open license store at {}", args.db.display()))?;
    info!("License store: {}", args.db.display());

    let notifier: Arc<dyn Notifier> = match &args.notify_url {
        Some(url) => {
            info!("Mismatch alerts: {url}");
            Arc::new(WebhookNotifier::new(url.clone()))
        }
        None => {
            info!("Mismatch alerts: disabled");
            Arc::new(NoopNotifier)
        }
    };

    if args.admin_secret.is_none() {
        info!("Provisioning endpoint: disabled (no --admin-secret)");
    }

    let store: Arc<dyn LicenseStore> = Arc::new(store);
    let service = Arc::new(VerificationService::new(store.clone(), notifier));
    let state = AppState {
        service,
        store,
        admin_secret: args.admin_secret,
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port))
        .await
        .with_context(|| format!("failed to bind port {}", args.port))?;
    info!("Listening on port {}", args.port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("HTTP server failed")?;

    Ok(())
}
