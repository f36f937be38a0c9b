//! Hotel Auth Gate - Main Entry Point
//!
//! Serves the gated API and a separate metrics listener, with a background
//! JWKS refresher when keys come from a remote endpoint.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use auth_gate::config::Config;
use auth_gate::observability::{init_logging, GateMetrics, LoggingConfig};
use auth_gate::server::{assemble, build_router, metrics_router};
use auth_gate::shutdown::{wait_for_signal, ShutdownCoordinator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    init_logging(&LoggingConfig {
        format: config.log_format,
        ..LoggingConfig::default()
    })
    .map_err(|e| anyhow::anyhow!(e))?;

    info!(key_source = ?config.key_source, "Starting Hotel Auth Gate");

    let metrics = Arc::new(GateMetrics::new()?);
    let components = assemble(&config, Arc::clone(&metrics)).await?;

    let mut coordinator = ShutdownCoordinator::new();

    if let Some(cache) = components.jwk_cache {
        coordinator.spawn("jwks-refresh", cache.refresh_periodically(config.jwks_refresh_interval()));
    }

    let metrics_listener = TcpListener::bind((config.host.as_str(), config.metrics_port))
        .await
        .with_context(|| format!("binding metrics port {}", config.metrics_port))?;
    info!(addr = %metrics_listener.local_addr()?, "Metrics listening");
    coordinator.spawn("metrics-server", async move {
        if let Err(e) = axum::serve(metrics_listener, metrics_router(metrics)).await {
            error!(error = %e, "Metrics server error");
        }
    });

    let api_listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("binding API port {}", config.port))?;
    info!(addr = %api_listener.local_addr()?, "Hotel Auth Gate listening");

    let result = axum::serve(api_listener, build_router(components.state))
        .with_graceful_shutdown(wait_for_signal())
        .await;
    if let Err(e) = &result {
        error!(error = %e, "Server error");
    }

    coordinator.shutdown(config.shutdown_timeout()).await;
    info!("Hotel Auth Gate stopped");

    result.map_err(Into::into)
}
