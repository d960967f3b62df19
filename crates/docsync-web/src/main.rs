//! HTTP front for docsync.
//!
//! Walks the browser through the Dropbox authorization, reports pending
//! files, then walks it through the Exact Online authorization and runs the
//! sync. Authorization state lives in a cookie-keyed, TTL-bounded session.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use docsync_core::{CategorySelector, CredentialStore, LedgerLocks};
use docsync_dropbox::DropboxClient;
use docsync_exact::ExactClient;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod handlers;
mod session;

use config::Config;
use handlers::{router, AppState};
use session::MokaSessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();

    info!("Starting docsync v{}", env!("CARGO_PKG_VERSION"));
    info!("  Host: {}", config.host);
    info!("  Port: {}", config.port);
    info!("  Dropbox root: {}", config.dropbox.root);
    info!("  Exact Online: {}", config.exact.base_url);
    info!("  Session TTL: {}s", config.session_ttl_secs);

    let category: CategorySelector = match config.exact_category.parse() {
        Ok(selector) => selector,
        Err(never) => match never {},
    };
    info!("  Document category: {}", category);

    match &config.public_url {
        Some(url) => info!("  Public URL: {}", url),
        None => warn!("  Public URL unset, OAuth callbacks are built from the Host header"),
    }

    // One pooled HTTP client for both providers
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;

    let sessions = Arc::new(MokaSessionStore::new(
        Duration::from_secs(config.session_ttl_secs),
        config.session_capacity,
    ));

    let state = AppState {
        credentials: CredentialStore::new(sessions),
        dropbox: Arc::new(DropboxClient::with_http_client(
            config.dropbox.clone(),
            http_client.clone(),
        )),
        exact: Arc::new(ExactClient::with_http_client(
            config.exact.clone(),
            http_client,
        )),
        locks: Arc::new(LedgerLocks::new()),
        category,
        public_url: config.public_url.clone(),
    };

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Bind and serve
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, initiating shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, initiating shutdown");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
