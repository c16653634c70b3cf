//! Daemon entry point: resolve the environment, wire the collaborators,
//! spawn the automation engine, serve the API, and shut down in order.

#![deny(unused_must_use)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use log::{info, warn};
use tokio::sync::watch;

use vivarium::api::{self, AppState};
use vivarium::app::engine::ClimateEngine;
use vivarium::app::ports::SettingsStore;
use vivarium::app::snapshot::ReadingSnapshot;
use vivarium::config::AppSettings;
use vivarium::hardware;
use vivarium::pins::PinMap;
use vivarium::store::{MemoryStore, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("vivarium {} starting", env!("CARGO_PKG_VERSION"));
    let settings = AppSettings::from_env();

    // Settings store: Postgres when configured, otherwise volatile memory
    // so the daemon stays usable on a bare development host.
    let store: Arc<dyn SettingsStore> = match &settings.database_url {
        Some(url) => Arc::new(
            PgStore::connect(url)
                .await
                .context("database connection failed")?,
        ),
        None => {
            warn!("no database configured, settings and logs are volatile");
            Arc::new(MemoryStore::new())
        }
    };

    let pins = PinMap::default();
    let (warm_sensor, cold_sensor, relays) =
        hardware::build(&settings, &pins).context("hardware init failed")?;

    let snapshot = Arc::new(ReadingSnapshot::new());
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let engine = ClimateEngine::new(
        Arc::clone(&store),
        warm_sensor,
        cold_sensor,
        Arc::clone(&relays.heat_mat),
        Arc::clone(&relays.fogger),
        Arc::clone(&relays.light),
        Arc::clone(&snapshot),
    );
    let engine_task = tokio::spawn(engine.run(shutdown_rx));

    let state = AppState {
        store,
        relays,
        snapshot,
        started_at: Instant::now(),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("HTTP API listening on {addr}");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    // Stop the engine after the server drains. Relays deliberately keep
    // their last commanded state across restarts.
    shutdown_tx.send(true).ok();
    engine_task.await.ok();
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}
