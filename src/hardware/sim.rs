//! Simulated probes and relays for host-side development.
//!
//! Selected by `MOCK_HARDWARE` (the default). Readings hover around a
//! per-zone baseline with light jitter, and relay switches go to the log
//! instead of a GPIO pin.

use std::time::Duration;

use chrono::Utc;
use log::info;

use crate::app::ports::{SensorPort, SensorSample};
use crate::error::{RelayError, SensorError};
use crate::relay::{RelayDriver, RelayId};

/// Jittered fake of a DHT22 zone probe.
pub struct SimSensor {
    name: &'static str,
    base_temp: f64,
    base_hum: f64,
}

impl SimSensor {
    pub fn new(name: &'static str, base_temp: f64, base_hum: f64) -> Self {
        Self {
            name,
            base_temp,
            base_hum,
        }
    }
}

impl SensorPort for SimSensor {
    fn read(&self) -> Result<SensorSample, SensorError> {
        // Physical probes are slow; keep the timing realistic.
        std::thread::sleep(Duration::from_millis(100));

        let temperature_c = self.base_temp + (fastrand::f64() - 0.5);
        let humidity_pct = (self.base_hum + (fastrand::f64() * 2.0 - 1.0)).clamp(0.0, 100.0);

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

/// Relay driver that only logs. Comes up de-energised like the real one.
pub struct SimRelayDriver {
    id: RelayId,
}

impl SimRelayDriver {
    pub fn new(id: RelayId) -> Self {
        Self { id }
    }
}

impl RelayDriver for SimRelayDriver {
    fn set(&mut self, energise: bool) -> Result<(), RelayError> {
        info!(
            "[sim] relay '{}' -> {}",
            self.id,
            if energise { "ON" } else { "OFF" }
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_readings_stay_near_the_baseline() {
        let sensor = SimSensor::new("WarmZone", 32.5, 60.0);
        for _ in 0..10 {
            let sample = sensor.read().unwrap();
            assert!((sample.temperature_c - 32.5).abs() <= 0.5);
            assert!((sample.humidity_pct - 60.0).abs() <= 1.0);
        }
    }
}
