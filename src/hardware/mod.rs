//! Hardware construction: simulated or device-backed, chosen at startup.
//!
//! Everything behind the port traits. The control core never learns which
//! variant it got, and in particular never learns the electrical polarity
//! of the relay modules.

pub mod dht22;
#[cfg(target_os = "linux")]
pub mod gpio;
pub mod sim;

use std::sync::Arc;

use log::info;

use crate::app::ports::SensorPort;
use crate::config::AppSettings;
use crate::error::InitError;
use crate::pins::PinMap;
use crate::relay::{Relay, RelayBank, RelayId};

/// Build both zone probes and the relay bank. Refuses pin maps with
/// overlapping assignments before touching any hardware.
pub fn build(
    settings: &AppSettings,
    pins: &PinMap,
) -> Result<(Arc<dyn SensorPort>, Arc<dyn SensorPort>, Arc<RelayBank>), InitError> {
    pins.validate()?;

    if settings.mock_hardware {
        info!("initialising simulated hardware (host mode)");
        return Ok(build_simulated());
    }

    info!("initialising GPIO-backed hardware");
    build_real(settings, pins)
}

fn build_simulated() -> (Arc<dyn SensorPort>, Arc<dyn SensorPort>, Arc<RelayBank>) {
    let warm: Arc<dyn SensorPort> = Arc::new(sim::SimSensor::new("WarmZone", 32.5, 60.0));
    let cold: Arc<dyn SensorPort> = Arc::new(sim::SimSensor::new("ColdZone", 25.0, 70.0));

    let bank = RelayBank {
        heat_mat: sim_relay(RelayId::HeatMat),
        fogger: sim_relay(RelayId::Fogger),
        light: sim_relay(RelayId::Light),
        spare: sim_relay(RelayId::Spare),
    };
    (warm, cold, Arc::new(bank))
}

fn sim_relay(id: RelayId) -> Arc<Relay> {
    Arc::new(Relay::new(id, Box::new(sim::SimRelayDriver::new(id))))
}

#[cfg(target_os = "linux")]
fn build_real(
    settings: &AppSettings,
    pins: &PinMap,
) -> Result<(Arc<dyn SensorPort>, Arc<dyn SensorPort>, Arc<RelayBank>), InitError> {
    let gpio = rppal::gpio::Gpio::new().map_err(|e| InitError::Gpio(e.to_string()))?;

    let warm: Arc<dyn SensorPort> = Arc::new(dht22::Dht22Probe::new(
        "WarmZone",
        &settings.dht_helper,
        pins.warm_sensor,
    ));
    let cold: Arc<dyn SensorPort> = Arc::new(dht22::Dht22Probe::new(
        "ColdZone",
        &settings.dht_helper,
        pins.cold_sensor,
    ));

    let relay = |id: RelayId, pin: u8| -> Result<Arc<Relay>, InitError> {
        let driver = gpio::GpioRelayDriver::new(&gpio, pin)?;
        info!("relay '{id}' on BCM {pin}, initialised de-energised");
        Ok(Arc::new(Relay::new(id, Box::new(driver))))
    };

    let bank = RelayBank {
        heat_mat: relay(RelayId::HeatMat, pins.heat_mat)?,
        fogger: relay(RelayId::Fogger, pins.fogger)?,
        light: relay(RelayId::Light, pins.light)?,
        spare: relay(RelayId::Spare, pins.spare)?,
    };
    Ok((warm, cold, Arc::new(bank)))
}

#[cfg(not(target_os = "linux"))]
fn build_real(
    _settings: &AppSettings,
    _pins: &PinMap,
) -> Result<(Arc<dyn SensorPort>, Arc<dyn SensorPort>, Arc<RelayBank>), InitError> {
    Err(InitError::Gpio(
        "GPIO hardware is only available on Linux; set MOCK_HARDWARE=true".into(),
    ))
}
