//! Postgres-backed settings store.
//!
//! The schema is a contract shared with the other collaborators (frontend,
//! reporting jobs): one `automation_settings` row with a fixed id, and two
//! append-only streams. Everything here is plain parameterised SQL against
//! a pool sized for two concurrent writers (the loop and the HTTP
//! surface). Pool acquisition is capped at two seconds so a dead database
//! degrades into skipped ticks instead of a wedged loop.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::info;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use uuid::Uuid;

use crate::app::events::{RelayLogEntry, SensorLogEntry, SwitchReason};
use crate::app::ports::SettingsStore;
use crate::config::{ClimateConfig, Mode};
use crate::error::StoreError;
use crate::relay::RelayId;

/// Fixed identity of the single settings row.
const SETTINGS_ROW_ID: i32 = 1;

const STORE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect, run pending migrations, and seed the settings row if this
    /// is a fresh database.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(2)
            .acquire_timeout(STORE_TIMEOUT)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))?;

        info!("connected to PostgreSQL");
        Ok(Self { pool })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut => Self::Timeout,
            other => Self::Backend(other.to_string()),
        }
    }
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn get_config(&self) -> Result<ClimateConfig, StoreError> {
        let config = sqlx::query_as::<_, ClimateConfig>(
            "SELECT warm_target_min, warm_target_max, cold_max_threshold, \
                    emergency_max_threshold, humidity_min, humidity_max, \
                    hysteresis_temp, hysteresis_hum \
             FROM automation_settings WHERE id = $1",
        )
        .bind(SETTINGS_ROW_ID)
        .fetch_one(&self.pool)
        .await?;
        Ok(config)
    }

    async fn update_config(&self, config: &ClimateConfig) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE automation_settings SET \
                 warm_target_min = $1, warm_target_max = $2, \
                 cold_max_threshold = $3, emergency_max_threshold = $4, \
                 humidity_min = $5, humidity_max = $6, \
                 hysteresis_temp = $7, hysteresis_hum = $8, \
                 updated_at = NOW() \
             WHERE id = $9",
        )
        .bind(config.warm_target_min)
        .bind(config.warm_target_max)
        .bind(config.cold_max_threshold)
        .bind(config.emergency_max_threshold)
        .bind(config.humidity_min)
        .bind(config.humidity_max)
        .bind(config.hysteresis_temp)
        .bind(config.hysteresis_hum)
        .bind(SETTINGS_ROW_ID)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_mode(&self) -> Result<Mode, StoreError> {
        let mode: String =
            sqlx::query_scalar("SELECT mode FROM automation_settings WHERE id = $1")
                .bind(SETTINGS_ROW_ID)
                .fetch_one(&self.pool)
                .await?;
        Mode::from_str(&mode).map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn set_mode(&self, mode: Mode) -> Result<(), StoreError> {
        sqlx::query("UPDATE automation_settings SET mode = $1, updated_at = NOW() WHERE id = $2")
            .bind(mode.as_str())
            .bind(SETTINGS_ROW_ID)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn append_sensor_log(&self, entry: &SensorLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO sensor_logs \
                 (recorded_at, warm_zone_temp, warm_zone_hum, cold_zone_temp, cold_zone_hum) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.recorded_at)
        .bind(entry.warm_zone_temp)
        .bind(entry.warm_zone_hum)
        .bind(entry.cold_zone_temp)
        .bind(entry.cold_zone_hum)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn append_relay_log(&self, entry: &RelayLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO relay_logs (id, relay_id, state, reason, recorded_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.id)
        .bind(entry.relay_id.as_str())
        .bind(entry.state)
        .bind(entry.reason.as_str())
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn sensor_history(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<SensorLogEntry>, StoreError> {
        let limit = if (1..=1000).contains(&limit) { limit } else { 100 };

        let rows = match (from, to) {
            (Some(from), Some(to)) => {
                sqlx::query_as::<_, SensorLogEntry>(
                    "SELECT recorded_at, warm_zone_temp, warm_zone_hum, \
                            cold_zone_temp, cold_zone_hum \
                     FROM sensor_logs \
                     WHERE recorded_at BETWEEN $1 AND $2 \
                     ORDER BY recorded_at DESC LIMIT $3",
                )
                .bind(from)
                .bind(to)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            _ => {
                sqlx::query_as::<_, SensorLogEntry>(
                    "SELECT recorded_at, warm_zone_temp, warm_zone_hum, \
                            cold_zone_temp, cold_zone_hum \
                     FROM sensor_logs \
                     ORDER BY recorded_at DESC LIMIT $1",
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    async fn relay_logs(&self, limit: i64, offset: i64) -> Result<Vec<RelayLogEntry>, StoreError> {
        let limit = if (1..=500).contains(&limit) { limit } else { 50 };
        let offset = offset.max(0);

        let rows = sqlx::query(
            "SELECT id, relay_id, state, reason, recorded_at \
             FROM relay_logs \
             ORDER BY recorded_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let relay_id: String = row.try_get("relay_id")?;
                let reason: String = row.try_get("reason")?;
                Ok(RelayLogEntry {
                    id: row.try_get::<Uuid, _>("id")?,
                    relay_id: RelayId::from_str(&relay_id)
                        .map_err(|e| StoreError::Backend(e.to_string()))?,
                    state: row.try_get("state")?,
                    reason: SwitchReason::from_str(&reason).map_err(StoreError::Backend)?,
                    recorded_at: row.try_get("recorded_at")?,
                })
            })
            .collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
