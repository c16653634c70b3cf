//! Request handlers.
//!
//! Thin glue: validate, delegate to the store or the relay bank, shape the
//! response. The one piece of real logic is [`toggle_relay`], the manual
//! override writer described in the concurrency model: it refuses to act
//! outside MANUAL mode and appends a `MANUAL_OVERRIDE` audit entry only
//! when the relay actually transitioned.

use axum::extract::{Path, Query, State};
use axum::Json;
use log::warn;

use crate::app::events::{RelayLogEntry, SensorLogEntry, SwitchReason};
use crate::config::{ClimateConfig, Mode};
use crate::relay::RelayId;

use super::models::{
    ApiError, CurrentReadings, HistoryQuery, LogQuery, ModeRequest, RelayStates,
    RelayToggleRequest, SystemStatus,
};
use super::AppState;

// ── System & configuration ────────────────────────────────────

pub async fn get_config(State(state): State<AppState>) -> Result<Json<ClimateConfig>, ApiError> {
    Ok(Json(state.store.get_config().await?))
}

pub async fn update_config(
    State(state): State<AppState>,
    Json(config): Json<ClimateConfig>,
) -> Result<Json<ClimateConfig>, ApiError> {
    config
        .validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    state.store.update_config(&config).await?;
    Ok(Json(config))
}

pub async fn system_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let db_status = match state.store.ping().await {
        Ok(()) => "OK",
        Err(_) => "ERROR",
    };
    let mode = match state.store.get_mode().await {
        Ok(mode) => mode.to_string(),
        Err(_) => "UNKNOWN".to_string(),
    };
    Json(SystemStatus {
        uptime: state.started_at.elapsed().as_secs(),
        mode,
        db_status,
    })
}

pub async fn set_mode(
    State(state): State<AppState>,
    Json(req): Json<ModeRequest>,
) -> Result<Json<ModeRequest>, ApiError> {
    state.store.set_mode(req.mode).await?;
    Ok(Json(req))
}

// ── Relays ────────────────────────────────────────────────────

pub async fn relay_states(State(state): State<AppState>) -> Json<RelayStates> {
    Json(RelayStates::from(state.relays.as_ref()))
}

pub async fn toggle_relay(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RelayToggleRequest>,
) -> Result<Json<RelayStates>, ApiError> {
    let id: RelayId = id
        .parse()
        .map_err(|e: crate::relay::UnknownRelay| ApiError::bad_request(e.to_string()))?;

    // Manual control is only legal in MANUAL mode; in AUTO the engine owns
    // the relays and an operator toggle would fight the hysteresis.
    let mode = state.store.get_mode().await?;
    if mode != Mode::Manual {
        return Err(ApiError::forbidden(
            "manual relay control requires MANUAL mode",
        ));
    }

    let relay = state.relays.get(id);
    let transitioned = if req.state { relay.on() } else { relay.off() }
        .map_err(|e| ApiError::internal(e.to_string()))?;

    if transitioned {
        let entry = RelayLogEntry::new(id, req.state, SwitchReason::ManualOverride);
        if let Err(e) = state.store.append_relay_log(&entry).await {
            warn!("relay log append failed: {e}");
        }
    }

    Ok(Json(RelayStates::from(state.relays.as_ref())))
}

// ── Sensors & history ─────────────────────────────────────────

pub async fn current_reading(State(state): State<AppState>) -> Json<Option<CurrentReadings>> {
    Json(state.snapshot.latest().map(CurrentReadings::from))
}

pub async fn sensor_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<SensorLogEntry>>, ApiError> {
    let rows = state
        .store
        .sensor_history(query.from, query.to, query.limit.unwrap_or(100))
        .await?;
    Ok(Json(rows))
}

pub async fn relay_logs(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Vec<RelayLogEntry>>, ApiError> {
    let rows = state
        .store
        .relay_logs(query.limit.unwrap_or(50), query.offset.unwrap_or(0))
        .await?;
    Ok(Json(rows))
}
