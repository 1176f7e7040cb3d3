//! herbcache server entry point.
//!
//! Boots the proxy in front of the configured origin and serves it over HTTP.
//! Logs are JSON on stderr.

use std::sync::Arc;

use anyhow::Result;
use herbcache_client::{HttpUpstream, UpstreamConfig, canonicalize_origin};
use herbcache_core::{AppConfig, PartitionStore, Proxy};
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

mod error;
mod routes;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let origin = canonicalize_origin(&config.origin)?;
    let store = PartitionStore::open(&config.db_path).await?;
    let upstream = Arc::new(HttpUpstream::new(UpstreamConfig::from(&config))?);
    let proxy = Arc::new(Proxy::new(config.proxy.clone(), origin.clone(), store, upstream));

    let mut events = proxy.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(?event, "lifecycle event"),
                Err(RecvError::Lagged(missed)) => tracing::warn!(missed, "lifecycle events dropped"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let lifecycle = proxy.clone();
    tokio::spawn(async move {
        if let Err(e) = lifecycle.run_lifecycle().await {
            tracing::error!(error = %e, "proxy lifecycle failed; forwarding requests uncached");
        }
    });

    let app = routes::router(proxy.clone(), config.max_bytes);
    let listener = TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, %origin, generation = %config.proxy.generation, "Starting herbcache");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    proxy.executor().settle().await;
    tracing::info!("herbcache stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
