use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

pub mod config;
pub mod dispatch;
pub mod server;
pub mod shortener;
pub mod telegram;
pub mod transcribe;

use crate::config::{Config, Credentials};
use crate::dispatch::Dispatcher;
use crate::server::AppState;

/// Loads settings, checks secrets and serves the webhook until Ctrl-C.
///
/// # Errors
/// Fails before binding if the config is unreadable or a secret is missing.
pub async fn run(config_path: &Path, listen_override: Option<String>) -> Result<()> {
    let mut config = Config::load_from(config_path)?;
    config.apply_env_overrides();
    if let Some(listen) = listen_override {
        config.server.listen = listen;
    }
    let credentials = Credentials::from_env()?;

    let addr = config.server.listen_addr()?;
    let webhook_path = config.server.webhook_path()?;
    let dispatcher = Dispatcher::new(&config, credentials)?;
    let state = AppState {
        dispatcher: Arc::new(dispatcher),
    };
    let app = server::router(state, webhook_path);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(
        %addr,
        webhook_path,
        model = %config.transcription.model,
        "shortscribe listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}
