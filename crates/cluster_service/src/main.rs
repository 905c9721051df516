mod config;
mod error;
mod http;
mod metrics;
mod params;
mod seed;
mod state;

use crate::config::Config;
use crate::metrics::Metrics;
use crate::seed::SeedFile;
use crate::state::AppState;
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = Config::parse();
    tracing::info!(config = ?config, "Loaded configuration");

    let seed = match &config.seed_path {
        Some(path) => SeedFile::load(path)?,
        None => SeedFile::dev().context("Embedded development seed is invalid")?,
    };
    let catalogs = seed.into_catalogs()?;

    let metrics = Arc::new(Metrics::new());
    let state = AppState::new(catalogs, metrics.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(());

    // Spawn the API server
    let api_handle = {
        let router = http::router(state, &config.api_prefix);
        let addr = config.listen_addr;
        let shutdown = wait_for_shutdown(shutdown_rx.clone());
        tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind API listener on {addr}"))?;
            tracing::info!(addr = %addr, "API server started");
            axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(shutdown)
                .await
                .context("API server failed")
        })
    };

    // Spawn the metrics server
    let metrics_handle = {
        let router = metrics.router();
        let addr = config.metrics_listen_addr;
        let shutdown = wait_for_shutdown(shutdown_rx);
        tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind metrics listener on {addr}"))?;
            tracing::info!(addr = %addr, "Metrics server started");
            axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(shutdown)
                .await
                .context("Metrics server failed")
        })
    };

    tracing::info!("All services started. Awaiting shutdown signal...");

    shutdown_signal().await;

    tracing::info!("Shutdown signal received. Terminating services...");
    // Dropping the sender wakes every receiver.
    drop(shutdown_tx);

    let (api_res, metrics_res) = tokio::join!(api_handle, metrics_handle);

    for (name, res) in [("API server", api_res), ("Metrics server", metrics_res)] {
        match res {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, task = name, "Task failed."),
            Err(e) => tracing::error!(error = %e, task = name, "Task panicked or was cancelled."),
        }
    }

    tracing::info!("Cluster service shut down gracefully.");
    Ok(())
}

/// Resolves once the shutdown sender is dropped.
async fn wait_for_shutdown(mut rx: watch::Receiver<()>) {
    let _ = rx.changed().await;
}

/// Listens for OS shutdown signals (SIGINT, SIGTERM) and resolves when one is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
