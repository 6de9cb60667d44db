//! ragdesk gateway: the proxy surface in front of the agentic RAG backend.
//! Config via `RagdeskConfig` (defaults < `config/ragdesk.toml` < `RAGDESK_*` env).

mod app;
mod error;
mod handlers;

use std::sync::Arc;

use ragdesk_core::RagdeskConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{build_app, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[ragdesk-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match RagdeskConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Config not loaded ({}); using defaults", e);
            RagdeskConfig::default()
        }
    };

    let state = Arc::new(AppState::new(&config.backend_url));
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(
        "ragdesk gateway {} listening on {} (backend {})",
        ragdesk_core::version(),
        config.bind_addr,
        config.backend_url
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested (Ctrl+C)");
        })
        .await?;
    Ok(())
}
