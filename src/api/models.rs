//! Request and response payloads for the HTTP surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::snapshot::ZoneReading;
use crate::config::Mode;
use crate::error::StoreError;
use crate::relay::RelayBank;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Standard error payload: `{"code": 400, "message": "..."}`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: 400,
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self {
            code: 403,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: 500,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        Self::internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    /// Seconds since process start.
    pub uptime: u64,
    /// Current mode, or `"UNKNOWN"` when the store is unreachable.
    pub mode: String,
    pub db_status: &'static str,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ModeRequest {
    pub mode: Mode,
}

// ---------------------------------------------------------------------------
// Relays
// ---------------------------------------------------------------------------

/// Commanded state of all four circuits.
#[derive(Debug, Serialize)]
pub struct RelayStates {
    pub heat_mat: bool,
    pub fogger: bool,
    pub light: bool,
    pub spare: bool,
}

impl From<&RelayBank> for RelayStates {
    fn from(bank: &RelayBank) -> Self {
        Self {
            heat_mat: bank.heat_mat.is_on(),
            fogger: bank.fogger.is_on(),
            light: bank.light.is_on(),
            spare: bank.spare.is_on(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RelayToggleRequest {
    pub state: bool,
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Flattened live reading, `null` until the first tick completes.
#[derive(Debug, Serialize)]
pub struct CurrentReadings {
    pub warm_temp: f64,
    pub warm_hum: f64,
    pub cold_temp: f64,
    pub cold_hum: f64,
    pub timestamp: DateTime<Utc>,
    pub mode: Mode,
}

impl From<ZoneReading> for CurrentReadings {
    fn from(r: ZoneReading) -> Self {
        Self {
            warm_temp: r.warm.temperature_c,
            warm_hum: r.warm.humidity_pct,
            cold_temp: r.cold.temperature_c,
            cold_hum: r.cold.humidity_pct,
            timestamp: r.taken_at,
            mode: r.mode,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
