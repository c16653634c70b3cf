//! Audit events emitted by the control core.
//!
//! Sensor entries are appended every completed tick; relay entries only on
//! actual transitions, tagged with the gate that caused them. Downstream
//! collaborators (history charts, alerting) consume these streams; the
//! core itself never reads them back.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::ports::SensorSample;
use crate::relay::RelayId;

// ---------------------------------------------------------------------------
// Switch reasons
// ---------------------------------------------------------------------------

/// Why a relay transitioned. The closed set is part of the persistence
/// contract (`relay_logs.reason`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwitchReason {
    /// Heating hysteresis crossed a band edge.
    AutoTempTrigger,
    /// Humidity hysteresis crossed a band edge.
    AutoHumidityTrigger,
    /// Cold zone overheated while the heat mat was on.
    ColdZoneProtection,
    /// Warm zone crossed the absolute safety bound.
    EmergencyCutoff,
    /// Operator toggle through the API in MANUAL mode.
    ManualOverride,
}

impl SwitchReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AutoTempTrigger => "AUTO_TEMP_TRIGGER",
            Self::AutoHumidityTrigger => "AUTO_HUMIDITY_TRIGGER",
            Self::ColdZoneProtection => "COLD_ZONE_PROTECTION",
            Self::EmergencyCutoff => "EMERGENCY_CUTOFF",
            Self::ManualOverride => "MANUAL_OVERRIDE",
        }
    }
}

impl fmt::Display for SwitchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwitchReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUTO_TEMP_TRIGGER" => Ok(Self::AutoTempTrigger),
            "AUTO_HUMIDITY_TRIGGER" => Ok(Self::AutoHumidityTrigger),
            "COLD_ZONE_PROTECTION" => Ok(Self::ColdZoneProtection),
            "EMERGENCY_CUTOFF" => Ok(Self::EmergencyCutoff),
            "MANUAL_OVERRIDE" => Ok(Self::ManualOverride),
            other => Err(format!("unrecognised switch reason: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor log
// ---------------------------------------------------------------------------

/// One row of the `sensor_logs` stream. Field names match the columns.
#[derive(Debug, Clone, Copy, Serialize, sqlx::FromRow)]
pub struct SensorLogEntry {
    pub recorded_at: DateTime<Utc>,
    pub warm_zone_temp: f64,
    pub warm_zone_hum: f64,
    pub cold_zone_temp: f64,
    pub cold_zone_hum: f64,
}

impl SensorLogEntry {
    pub fn from_zones(warm: &SensorSample, cold: &SensorSample, at: DateTime<Utc>) -> Self {
        Self {
            recorded_at: at,
            warm_zone_temp: warm.temperature_c,
            warm_zone_hum: warm.humidity_pct,
            cold_zone_temp: cold.temperature_c,
            cold_zone_hum: cold.humidity_pct,
        }
    }
}

// ---------------------------------------------------------------------------
// Relay log
// ---------------------------------------------------------------------------

/// One row of the `relay_logs` audit stream.
#[derive(Debug, Clone, Serialize)]
pub struct RelayLogEntry {
    pub id: Uuid,
    pub relay_id: RelayId,
    /// State the relay holds after the transition.
    pub state: bool,
    pub reason: SwitchReason,
    pub recorded_at: DateTime<Utc>,
}

impl RelayLogEntry {
    pub fn new(relay_id: RelayId, state: bool, reason: SwitchReason) -> Self {
        Self {
            id: Uuid::new_v4(),
            relay_id,
            state,
            reason,
            recorded_at: Utc::now(),
        }
    }
}
