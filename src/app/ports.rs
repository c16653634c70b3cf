//! Port traits: the boundary between the control core and the outside
//! world.
//!
//! ```text
//!   SensorPort ──▶ ┌──────────────────────┐ ──▶ Relay commands
//!                  │    ClimateEngine      │
//!  SettingsStore ◀─│  safety · hysteresis  │──▶ ReadingSnapshot
//!                  └──────────────────────┘
//! ```
//!
//! Driven adapters (probes, the Postgres store, the in-memory store)
//! implement these traits; the engine consumes them through trait objects
//! and never touches hardware or SQL directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::app::events::{RelayLogEntry, SensorLogEntry};
use crate::config::{ClimateConfig, Mode};
use crate::error::{SensorError, StoreError};

// ---------------------------------------------------------------------------
// Sensor port
// ---------------------------------------------------------------------------

/// One combined temperature/humidity measurement from a zone probe. The
/// DHT22 reports both values in a single acquisition, so they always come
/// as a pair with one timestamp.
#[derive(Debug, Clone, Copy)]
pub struct SensorSample {
    pub temperature_c: f64,
    /// Relative humidity, 0–100. Implementations reject values outside
    /// that range as a transient fault.
    pub humidity_pct: f64,
    pub taken_at: DateTime<Utc>,
}

/// Read-side port for one zone probe.
///
/// `read` may block for up to ~2 s (the DHT protocol is slow); the engine
/// budgets 3 s per acquisition including the implementation's own retry
/// budget. Implementations MUST NOT cache; the tick-level cache is the
/// [`ReadingSnapshot`](crate::app::snapshot::ReadingSnapshot), and a probe
/// that returns yesterday's air would defeat the safety gates.
pub trait SensorPort: Send + Sync {
    /// Perform a fresh acquisition.
    fn read(&self) -> Result<SensorSample, SensorError>;

    /// Zone label, e.g. `"WarmZone"`.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Settings store
// ---------------------------------------------------------------------------

/// Persistence collaborator for the single settings record, the mode flag,
/// and the two append-only audit streams.
///
/// The engine tolerates every method failing: reads make it skip the
/// tick's automation, appends are fire-and-forget. Implementations must be
/// safe for concurrent access by the loop and the HTTP surface, and a
/// config stale by one tick is acceptable.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_config(&self) -> Result<ClimateConfig, StoreError>;

    /// Persist a new configuration atomically. Validation happens at the
    /// API boundary before this is called.
    async fn update_config(&self, config: &ClimateConfig) -> Result<(), StoreError>;

    async fn get_mode(&self) -> Result<Mode, StoreError>;

    async fn set_mode(&self, mode: Mode) -> Result<(), StoreError>;

    async fn append_sensor_log(&self, entry: &SensorLogEntry) -> Result<(), StoreError>;

    async fn append_relay_log(&self, entry: &RelayLogEntry) -> Result<(), StoreError>;

    /// Historical sensor readings, newest first. `limit` is clamped by the
    /// implementation.
    async fn sensor_history(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<SensorLogEntry>, StoreError>;

    /// Relay audit trail, newest first, paginated.
    async fn relay_logs(&self, limit: i64, offset: i64) -> Result<Vec<RelayLogEntry>, StoreError>;

    /// Cheap liveness probe for the status endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
