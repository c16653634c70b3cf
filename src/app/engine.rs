//! The climate automation engine.
//!
//! One tick every five seconds: read both zones, publish the snapshot,
//! append the sensor audit, then run the gates in a fixed order:
//!
//! ```text
//!   mode refresh ─▶ acquire ─▶ snapshot ─▶ audit ─▶ config
//!        ─▶ emergency gate ─▶ cold-zone gate ─▶ mode gate
//!        ─▶ heating hysteresis ─▶ humidity hysteresis
//! ```
//!
//! The two safety gates run in both modes and outrank everything,
//! including the operator; the hysteresis gates run only in AUTO. A tick
//! that cannot read its sensors or its configuration is skipped whole,
//! and a skipped tick never switches heating off: probe glitches are
//! routine on these boards, and a defensive cutoff would turn every
//! glitch into a thermal oscillation.
//!
//! The engine owns the relay handles for automation purposes; the manual
//! override path shares them through the per-relay mutex inside
//! [`Relay`], so a safety cutoff can never race a manual switch-on.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{error, info, warn};
use tokio::sync::watch;
use tokio::task;
use tokio::time::MissedTickBehavior;

use crate::app::events::{RelayLogEntry, SensorLogEntry, SwitchReason};
use crate::app::ports::{SensorPort, SensorSample, SettingsStore};
use crate::app::snapshot::{ReadingSnapshot, ZoneReading};
use crate::config::Mode;
use crate::control::{Band, BandPosition};
use crate::error::SensorError;
use crate::relay::Relay;

/// Control loop period. Ticks are not aligned to wall clock; a tick that
/// overruns makes the next one fire immediately, and missed fires coalesce
/// rather than queue.
pub const TICK_PERIOD: Duration = Duration::from_secs(5);

/// Per-zone acquisition deadline, covering the probe's own retry budget.
const SENSOR_READ_TIMEOUT: Duration = Duration::from_secs(3);

/// The periodic controller fusing sensors, settings, and mode into relay
/// commands.
pub struct ClimateEngine {
    store: Arc<dyn SettingsStore>,
    warm_sensor: Arc<dyn SensorPort>,
    cold_sensor: Arc<dyn SensorPort>,
    heat_mat: Arc<Relay>,
    fogger: Arc<Relay>,
    light: Arc<Relay>,
    snapshot: Arc<ReadingSnapshot>,
    /// Cached mode, refreshed from the store at the top of every tick.
    mode: Mode,
    tick_count: u64,
    skipped_ticks: u64,
    shutdown: Option<watch::Receiver<bool>>,
}

impl ClimateEngine {
    /// The spare relay is absent on purpose: nothing here ever drives it.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn SettingsStore>,
        warm_sensor: Arc<dyn SensorPort>,
        cold_sensor: Arc<dyn SensorPort>,
        heat_mat: Arc<Relay>,
        fogger: Arc<Relay>,
        light: Arc<Relay>,
        snapshot: Arc<ReadingSnapshot>,
    ) -> Self {
        Self {
            store,
            warm_sensor,
            cold_sensor,
            heat_mat,
            fogger,
            light,
            snapshot,
            mode: Mode::Auto,
            tick_count: 0,
            skipped_ticks: 0,
            shutdown: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Drive the loop until the shutdown signal fires. On shutdown the
    /// in-flight sensor reads are allowed to finish but no new actuator
    /// commands are issued, and the relays keep their last commanded state
    /// (a restart mid-incubation must not cool the enclosure).
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        self.shutdown = Some(shutdown.clone());

        // Restore the persisted mode so a restart does not silently drop
        // the operator back into AUTO.
        match self.store.get_mode().await {
            Ok(mode) => {
                self.mode = mode;
                info!("automation engine starting in {} mode", self.mode);
            }
            Err(e) => warn!("could not restore mode ({e}), starting in {}", self.mode),
        }

        let mut ticker = tokio::time::interval(TICK_PERIOD);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                // A dropped sender counts as shutdown: the owning context
                // is gone.
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        info!("automation engine stopped, relays keep their last state");
                        return;
                    }
                }
            }
            if self.cancelled() {
                info!("automation engine stopped, relays keep their last state");
                return;
            }
        }
    }

    fn cancelled(&self) -> bool {
        self.shutdown.as_ref().is_some_and(|rx| *rx.borrow())
    }

    // ── Per-tick procedure ────────────────────────────────────

    /// One full control cycle. Public so the integration tests can drive
    /// the gates directly without the timer.
    pub async fn tick(&mut self) {
        self.tick_count += 1;

        // 1. Mode refresh. A read failure keeps the cached mode; the
        //    safety gates below do not depend on it anyway.
        match self.store.get_mode().await {
            Ok(mode) if mode != self.mode => {
                info!("mode changed {} -> {}", self.mode, mode);
                self.mode = mode;
            }
            Ok(_) => {}
            Err(e) => warn!("mode refresh failed, keeping {}: {e}", self.mode),
        }

        // 2. Sensor acquisition, both zones concurrently. Either failure
        //    skips the whole tick: no snapshot, no audit, no relays.
        let (warm, cold) = tokio::join!(
            acquire(&self.warm_sensor),
            acquire(&self.cold_sensor)
        );
        let warm = self.unwrap_reading(warm, self.warm_sensor.name());
        let cold = self.unwrap_reading(cold, self.cold_sensor.name());
        let (Some(warm), Some(cold)) = (warm, cold) else {
            self.skipped_ticks += 1;
            return;
        };

        // 3. Snapshot publish for concurrent observers.
        let now = Utc::now();
        self.snapshot.publish(ZoneReading {
            warm,
            cold,
            taken_at: now,
            mode: self.mode,
        });

        // 4. Sensor audit, fire-and-forget.
        let entry = SensorLogEntry::from_zones(&warm, &cold, now);
        if let Err(e) = self.store.append_sensor_log(&entry).await {
            warn!("sensor log append failed: {e}");
        }

        // Cancelled mid-tick: the reads finished, but no new actuator
        // commands are started.
        if self.cancelled() {
            return;
        }

        // 5. Config fetch. Without thresholds no gate can be evaluated,
        //    so the tick ends here with the relays untouched.
        let cfg = match self.store.get_config().await {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("configuration unavailable, skipping automation: {e}");
                return;
            }
        };

        // 6. Emergency gate, both modes. The lamp is shed too, since it
        //    radiates heat. Terminates the tick.
        if warm.temperature_c >= cfg.emergency_max_threshold {
            error!(
                "EMERGENCY: warm zone {:.1} °C at or above cutoff {:.1} °C, shedding all heat sources",
                warm.temperature_c, cfg.emergency_max_threshold
            );
            for relay in [&self.heat_mat, &self.fogger, &self.light] {
                self.switch(relay, false, SwitchReason::EmergencyCutoff).await;
            }
            return;
        }

        // 7. Cold-zone protection, both modes. Cuts heating only; the
        //    rest of the tick still runs.
        if cold.temperature_c >= cfg.cold_max_threshold && self.heat_mat.is_on() {
            warn!(
                "cold zone {:.1} °C at or above limit {:.1} °C, cutting heat",
                cold.temperature_c, cfg.cold_max_threshold
            );
            self.switch(&self.heat_mat, false, SwitchReason::ColdZoneProtection)
                .await;
        }

        // 8. Mode gate. Everything below is AUTO-only.
        if self.mode == Mode::Manual {
            return;
        }

        // 9. Heating hysteresis on the warm zone.
        let band = Band::around(cfg.warm_target_min, cfg.warm_target_max, cfg.hysteresis_temp);
        match band.classify(warm.temperature_c) {
            BandPosition::BelowLow if !self.heat_mat.is_on() => {
                info!(
                    "warm zone {:.1} °C at or below {:.1} °C, heating on",
                    warm.temperature_c, band.low
                );
                self.switch(&self.heat_mat, true, SwitchReason::AutoTempTrigger)
                    .await;
            }
            BandPosition::AboveHigh if self.heat_mat.is_on() => {
                info!(
                    "warm zone {:.1} °C at or above {:.1} °C, heating off",
                    warm.temperature_c, band.high
                );
                self.switch(&self.heat_mat, false, SwitchReason::AutoTempTrigger)
                    .await;
            }
            _ => {}
        }

        // 10. Humidity hysteresis on the fogger. The warm zone's humidity
        //     is the input: that is the inhabited micro-climate.
        let band = Band::around(cfg.humidity_min, cfg.humidity_max, cfg.hysteresis_hum);
        match band.classify(warm.humidity_pct) {
            BandPosition::BelowLow if !self.fogger.is_on() => {
                info!(
                    "humidity {:.1} % at or below {:.1} %, fogger on",
                    warm.humidity_pct, band.low
                );
                self.switch(&self.fogger, true, SwitchReason::AutoHumidityTrigger)
                    .await;
            }
            BandPosition::AboveHigh if self.fogger.is_on() => {
                info!(
                    "humidity {:.1} % at or above {:.1} %, fogger off",
                    warm.humidity_pct, band.high
                );
                self.switch(&self.fogger, false, SwitchReason::AutoHumidityTrigger)
                    .await;
            }
            _ => {}
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Ticks abandoned because a zone probe failed. Diagnostics only.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped_ticks
    }

    // ── Internal ──────────────────────────────────────────────

    fn unwrap_reading(
        &self,
        result: Result<SensorSample, SensorError>,
        zone: &str,
    ) -> Option<SensorSample> {
        match result {
            Ok(sample) => Some(sample),
            Err(e) => {
                warn!("{zone} read failed, skipping tick: {e}");
                None
            }
        }
    }

    /// Command a relay and append the audit entry when the commanded state
    /// actually transitioned. A command fault is logged and nothing else:
    /// the commanded state stays put, so the next evaluation retries.
    async fn switch(&self, relay: &Relay, energise: bool, reason: SwitchReason) {
        let outcome = if energise { relay.on() } else { relay.off() };
        match outcome {
            Ok(true) => {
                let entry = RelayLogEntry::new(relay.id(), energise, reason);
                if let Err(e) = self.store.append_relay_log(&entry).await {
                    warn!("relay log append failed: {e}");
                }
            }
            Ok(false) => {}
            Err(e) => warn!("relay {} command failed: {e}", relay.name()),
        }
    }
}

/// Run one blocking acquisition on the worker pool, bounded by the sensor
/// deadline. The probe call itself must not be cancelled mid-bit-bang, so
/// on timeout the worker is left to finish in the background and its
/// result is dropped.
async fn acquire(sensor: &Arc<dyn SensorPort>) -> Result<SensorSample, SensorError> {
    let sensor = Arc::clone(sensor);
    let read = task::spawn_blocking(move || sensor.read());
    match tokio::time::timeout(SENSOR_READ_TIMEOUT, read).await {
        Err(_) => Err(SensorError::Timeout),
        Ok(Err(_)) => Err(SensorError::Probe("sensor worker panicked".into())),
        Ok(Ok(result)) => result,
    }
}
