use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use lotkeeper_api::{app, worker, AppState};
use lotkeeper_core::TieredRate;
use lotkeeper_store::{app_config::Config, apply_seed, snapshot, EventBus, MemoryStore};
use lotkeeper_ticketing::ParkingLot;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "lotkeeper_api=debug,lotkeeper_ticketing=info,lotkeeper_store=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Lotkeeper API on port {}", config.server.port);

    // Storage
    let store = Arc::new(MemoryStore::new());
    let snapshot_path = config.storage.snapshot_path.as_ref().map(PathBuf::from);
    if let Some(path) = &snapshot_path {
        snapshot::restore(&store, path)
            .await
            .context("Failed to restore snapshot")?;
    }
    let repos = store.repositories();
    apply_seed(&repos, &config.seed)
        .await
        .context("Failed to apply seed data")?;

    // Event fan-out for the SSE stream
    let events = EventBus::new(config.server.event_buffer);

    let lot = ParkingLot::new(
        repos,
        Arc::new(TieredRate::new(config.rates.clone())),
        Arc::new(events.clone()),
    );

    let snapshot_worker = snapshot_path.clone().map(|path| {
        worker::start_snapshot_worker(
            store.clone(),
            path,
            Duration::from_secs(config.storage.snapshot_interval_seconds.max(1)),
        )
    });

    let app = app(AppState { lot, events });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(handle) = snapshot_worker {
        handle.abort();
    }
    if let Some(path) = &snapshot_path {
        snapshot::persist(&store, path)
            .await
            .context("Failed to write final snapshot")?;
        tracing::info!("Final snapshot written to {}", path.display());
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler, run until killed.
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
