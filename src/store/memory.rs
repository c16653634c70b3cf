//! In-memory settings store.
//!
//! Backs the integration tests and database-free host runs. Same
//! concurrency contract as the Postgres store (loop + HTTP surface), so
//! all state sits behind one mutex.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};

use crate::app::events::{RelayLogEntry, SensorLogEntry};
use crate::app::ports::SettingsStore;
use crate::config::{ClimateConfig, Mode};
use crate::error::StoreError;

#[derive(Default)]
struct State {
    config: ClimateConfig,
    mode: Option<Mode>,
    sensor_logs: Vec<SensorLogEntry>,
    relay_logs: Vec<RelayLogEntry>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a specific configuration instead of the defaults.
    pub fn with_config(config: ClimateConfig) -> Self {
        let store = Self::new();
        store.lock().config = config;
        store
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_config(&self) -> Result<ClimateConfig, StoreError> {
        Ok(self.lock().config.clone())
    }

    async fn update_config(&self, config: &ClimateConfig) -> Result<(), StoreError> {
        self.lock().config = config.clone();
        Ok(())
    }

    async fn get_mode(&self) -> Result<Mode, StoreError> {
        Ok(self.lock().mode.unwrap_or(Mode::Auto))
    }

    async fn set_mode(&self, mode: Mode) -> Result<(), StoreError> {
        self.lock().mode = Some(mode);
        Ok(())
    }

    async fn append_sensor_log(&self, entry: &SensorLogEntry) -> Result<(), StoreError> {
        self.lock().sensor_logs.push(*entry);
        Ok(())
    }

    async fn append_relay_log(&self, entry: &RelayLogEntry) -> Result<(), StoreError> {
        self.lock().relay_logs.push(entry.clone());
        Ok(())
    }

    async fn sensor_history(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<SensorLogEntry>, StoreError> {
        let limit = if (1..=1000).contains(&limit) { limit } else { 100 };
        let state = self.lock();
        let mut rows: Vec<_> = state
            .sensor_logs
            .iter()
            .filter(|e| from.map_or(true, |f| e.recorded_at >= f))
            .filter(|e| to.map_or(true, |t| e.recorded_at <= t))
            .copied()
            .collect();
        rows.reverse(); // newest first, matching the SQL ordering
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn relay_logs(&self, limit: i64, offset: i64) -> Result<Vec<RelayLogEntry>, StoreError> {
        let limit = if (1..=500).contains(&limit) { limit } else { 50 };
        let offset = offset.max(0) as usize;
        let state = self.lock();
        let mut rows: Vec<_> = state.relay_logs.clone();
        rows.reverse();
        Ok(rows.into_iter().skip(offset).take(limit as usize).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
