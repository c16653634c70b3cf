//! Mock hardware and store instrumentation for the integration tests.
//!
//! Records every driver write so tests can assert on the full command
//! history without touching GPIO, and injects store/sensor/relay faults
//! to exercise the failure semantics of the control loop.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use vivarium::app::engine::ClimateEngine;
use vivarium::app::events::{RelayLogEntry, SensorLogEntry};
use vivarium::app::ports::{SensorPort, SensorSample, SettingsStore};
use vivarium::app::snapshot::ReadingSnapshot;
use vivarium::config::{ClimateConfig, Mode};
use vivarium::error::{RelayError, SensorError, StoreError};
use vivarium::relay::{Relay, RelayDriver, RelayId};
use vivarium::store::MemoryStore;

// ── Scripted sensor ───────────────────────────────────────────

/// A zone probe whose next reading the test sets directly.
pub struct TestSensor {
    name: &'static str,
    current: Mutex<(f64, f64)>,
    fail: AtomicBool,
}

impl TestSensor {
    pub fn new(name: &'static str, temp: f64, hum: f64) -> Arc<Self> {
        Arc::new(Self {
            name,
            current: Mutex::new((temp, hum)),
            fail: AtomicBool::new(false),
        })
    }

    pub fn set(&self, temp: f64, hum: f64) {
        *self.current.lock().unwrap() = (temp, hum);
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl SensorPort for TestSensor {
    fn read(&self) -> Result<SensorSample, SensorError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SensorError::Probe("injected sensor fault".into()));
        }
        let (temperature_c, humidity_pct) = *self.current.lock().unwrap();
        Ok(SensorSample {
            temperature_c,
            humidity_pct,
            taken_at: Utc::now(),
        })
    }

    fn name(&self) -> &str {
        self.name
    }
}

// ── Recording relay driver ────────────────────────────────────

/// Driver that records every write and can be told to fail.
pub struct RecordingDriver {
    writes: Arc<Mutex<Vec<bool>>>,
    fail: Arc<AtomicBool>,
}

impl RelayDriver for RecordingDriver {
    fn set(&mut self, energise: bool) -> Result<(), RelayError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(RelayError::Gpio("injected relay fault".into()));
        }
        self.writes.lock().unwrap().push(energise);
        Ok(())
    }
}

pub fn recording_relay(id: RelayId) -> (Arc<Relay>, Arc<Mutex<Vec<bool>>>, Arc<AtomicBool>) {
    let writes = Arc::new(Mutex::new(Vec::new()));
    let fail = Arc::new(AtomicBool::new(false));
    let driver = RecordingDriver {
        writes: Arc::clone(&writes),
        fail: Arc::clone(&fail),
    };
    (Arc::new(Relay::new(id, Box::new(driver))), writes, fail)
}

// ── Fault-injecting store ─────────────────────────────────────

/// Wraps [`MemoryStore`] with per-operation failure switches.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    pub fail_config: AtomicBool,
    pub fail_mode: AtomicBool,
    pub fail_sensor_log: AtomicBool,
    pub fail_relay_log: AtomicBool,
}

impl FlakyStore {
    pub fn with_config(config: ClimateConfig) -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryStore::with_config(config),
            ..Self::default()
        })
    }

    fn injected(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Backend("injected store fault".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SettingsStore for FlakyStore {
    async fn get_config(&self) -> Result<ClimateConfig, StoreError> {
        Self::injected(&self.fail_config)?;
        self.inner.get_config().await
    }

    async fn update_config(&self, config: &ClimateConfig) -> Result<(), StoreError> {
        self.inner.update_config(config).await
    }

    async fn get_mode(&self) -> Result<Mode, StoreError> {
        Self::injected(&self.fail_mode)?;
        self.inner.get_mode().await
    }

    async fn set_mode(&self, mode: Mode) -> Result<(), StoreError> {
        self.inner.set_mode(mode).await
    }

    async fn append_sensor_log(&self, entry: &SensorLogEntry) -> Result<(), StoreError> {
        Self::injected(&self.fail_sensor_log)?;
        self.inner.append_sensor_log(entry).await
    }

    async fn append_relay_log(&self, entry: &RelayLogEntry) -> Result<(), StoreError> {
        Self::injected(&self.fail_relay_log)?;
        self.inner.append_relay_log(entry).await
    }

    async fn sensor_history(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<SensorLogEntry>, StoreError> {
        self.inner.sensor_history(from, to, limit).await
    }

    async fn relay_logs(&self, limit: i64, offset: i64) -> Result<Vec<RelayLogEntry>, StoreError> {
        self.inner.relay_logs(limit, offset).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ── Test rig ──────────────────────────────────────────────────

/// A fully mocked engine plus handles to everything a test asserts on.
pub struct Rig {
    pub engine: ClimateEngine,
    pub warm: Arc<TestSensor>,
    pub cold: Arc<TestSensor>,
    pub store: Arc<FlakyStore>,
    pub snapshot: Arc<ReadingSnapshot>,
    pub heat_mat: Arc<Relay>,
    pub fogger: Arc<Relay>,
    pub light: Arc<Relay>,
    pub heat_writes: Arc<Mutex<Vec<bool>>>,
    pub heat_fail: Arc<AtomicBool>,
}

/// Fresh rig: everything OFF, mode AUTO, default config (31.5/33.0 warm
/// band, 26.5 cold limit, 35.0 emergency, 50-65 % humidity, 0.5 °C and
/// 2.0 % hysteresis), warm zone in-band.
pub fn rig() -> Rig {
    rig_with_config(ClimateConfig::default())
}

pub fn rig_with_config(config: ClimateConfig) -> Rig {
    let warm = TestSensor::new("WarmZone", 32.0, 58.0);
    let cold = TestSensor::new("ColdZone", 25.0, 60.0);
    let store = FlakyStore::with_config(config);
    let snapshot = Arc::new(ReadingSnapshot::new());

    let (heat_mat, heat_writes, heat_fail) = recording_relay(RelayId::HeatMat);
    let (fogger, _, _) = recording_relay(RelayId::Fogger);
    let (light, _, _) = recording_relay(RelayId::Light);

    let store_port: Arc<dyn SettingsStore> = store.clone();
    let warm_port: Arc<dyn SensorPort> = warm.clone();
    let cold_port: Arc<dyn SensorPort> = cold.clone();
    let engine = ClimateEngine::new(
        store_port,
        warm_port,
        cold_port,
        Arc::clone(&heat_mat),
        Arc::clone(&fogger),
        Arc::clone(&light),
        Arc::clone(&snapshot),
    );

    Rig {
        engine,
        warm,
        cold,
        store,
        snapshot,
        heat_mat,
        fogger,
        light,
        heat_writes,
        heat_fail,
    }
}

/// Relay audit entries in append order.
pub async fn audit_trail(store: &Arc<FlakyStore>) -> Vec<RelayLogEntry> {
    let mut entries = store.relay_logs(500, 0).await.unwrap();
    entries.reverse();
    entries
}
