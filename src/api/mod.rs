//! HTTP surface (collaborator, not part of the control core).
//!
//! The router exposes the settings record, the mode flag, the live
//! snapshot, the audit streams, and the manual relay override. The
//! override path goes through the same [`Relay`](crate::relay::Relay)
//! handles as the engine's safety gates, so both writers serialise on the
//! per-relay mutex.

pub mod handlers;
pub mod models;

use std::sync::Arc;
use std::time::Instant;

use axum::routing::{get, post};
use axum::Router;

use crate::app::ports::SettingsStore;
use crate::app::snapshot::ReadingSnapshot;
use crate::relay::RelayBank;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SettingsStore>,
    pub relays: Arc<RelayBank>,
    pub snapshot: Arc<ReadingSnapshot>,
    pub started_at: Instant,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/config",
            get(handlers::get_config).put(handlers::update_config),
        )
        .route("/api/v1/system/status", get(handlers::system_status))
        .route("/api/v1/system/mode", post(handlers::set_mode))
        .route("/api/v1/relays", get(handlers::relay_states))
        .route("/api/v1/relays/:id/toggle", post(handlers::toggle_relay))
        .route("/api/v1/sensors/current", get(handlers::current_reading))
        .route("/api/v1/metrics/sensors", get(handlers::sensor_history))
        .route("/api/v1/relay-logs", get(handlers::relay_logs))
        .with_state(state)
}
