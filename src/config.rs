//! Climate configuration and operational settings.
//!
//! [`ClimateConfig`] is the single persisted record of automation
//! thresholds; the control loop re-reads it every tick so edits through the
//! API take effect within one cycle. Values are validated on the way in,
//! never clamped.
//!
//! [`AppSettings`] is the process-level environment (database endpoint,
//! HTTP port, mock/real hardware switch) resolved once at startup.

use std::env;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Operating mode
// ---------------------------------------------------------------------------

/// Global automation mode. In `Auto` the control loop drives the relays
/// from hysteresis; in `Manual` it leaves non-safety actuators to the
/// operator. The safety gates run in both modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Auto,
    Manual,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "AUTO",
            Self::Manual => "MANUAL",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AUTO" => Ok(Self::Auto),
            "MANUAL" => Ok(Self::Manual),
            _ => Err(ConfigError::Invalid("mode must be AUTO or MANUAL")),
        }
    }
}

// ---------------------------------------------------------------------------
// Automation thresholds
// ---------------------------------------------------------------------------

/// The single active automation-settings record.
///
/// Field names are part of the persistence contract (`automation_settings`
/// columns) and of the API payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClimateConfig {
    /// Warm-zone temperature (°C) at which heating switches on.
    pub warm_target_min: f64,
    /// Warm-zone temperature (°C) at which heating switches off.
    pub warm_target_max: f64,
    /// Upper safety bound for the cold zone (°C); above it the heat mat is
    /// cut so the gradient stays usable for thermoregulation.
    pub cold_max_threshold: f64,
    /// Absolute warm-zone bound (°C); at or above it every heat-producing
    /// relay is de-energised regardless of mode.
    pub emergency_max_threshold: f64,
    /// Humidity (%) at which the fog generator switches on.
    pub humidity_min: f64,
    /// Humidity (%) at which the fog generator switches off.
    pub humidity_max: f64,
    /// Temperature deadband half-width (°C), applied symmetrically.
    pub hysteresis_temp: f64,
    /// Humidity deadband half-width (%), applied symmetrically.
    pub hysteresis_hum: f64,
}

impl Default for ClimateConfig {
    fn default() -> Self {
        Self {
            warm_target_min: 31.5,
            warm_target_max: 33.0,
            cold_max_threshold: 26.5,
            emergency_max_threshold: 35.0,
            humidity_min: 50.0,
            humidity_max: 65.0,
            hysteresis_temp: 0.5,
            hysteresis_hum: 2.0,
        }
    }
}

impl ClimateConfig {
    /// Range and ordering validation. Rejects, never clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(20.0..=40.0).contains(&self.warm_target_min) {
            return Err(ConfigError::Invalid("warm_target_min must be within 20..=40 °C"));
        }
        if !(20.0..=40.0).contains(&self.warm_target_max) {
            return Err(ConfigError::Invalid("warm_target_max must be within 20..=40 °C"));
        }
        if self.warm_target_min >= self.warm_target_max {
            return Err(ConfigError::Invalid("warm_target_min must be below warm_target_max"));
        }
        if !(20.0..=35.0).contains(&self.cold_max_threshold) {
            return Err(ConfigError::Invalid("cold_max_threshold must be within 20..=35 °C"));
        }
        if !(30.0..=45.0).contains(&self.emergency_max_threshold) {
            return Err(ConfigError::Invalid("emergency_max_threshold must be within 30..=45 °C"));
        }
        if self.emergency_max_threshold <= self.warm_target_max {
            return Err(ConfigError::Invalid(
                "emergency_max_threshold must be above warm_target_max",
            ));
        }
        if !(0.0..=100.0).contains(&self.humidity_min) || !(0.0..=100.0).contains(&self.humidity_max) {
            return Err(ConfigError::Invalid("humidity bounds must be within 0..=100 %"));
        }
        if self.humidity_min >= self.humidity_max {
            return Err(ConfigError::Invalid("humidity_min must be below humidity_max"));
        }
        if !(0.1..=5.0).contains(&self.hysteresis_temp) {
            return Err(ConfigError::Invalid("hysteresis_temp must be within 0.1..=5 °C"));
        }
        if !(0.5..=10.0).contains(&self.hysteresis_hum) {
            return Err(ConfigError::Invalid("hysteresis_hum must be within 0.5..=10 %"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Process environment
// ---------------------------------------------------------------------------

/// Operational settings resolved from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppSettings {
    /// Postgres connection string. `None` means run on the volatile
    /// in-memory store (host-side development).
    pub database_url: Option<String>,
    /// HTTP listen port.
    pub http_port: u16,
    /// Use simulated probes and relays instead of real GPIO.
    pub mock_hardware: bool,
    /// Helper program invoked as `<helper> <bcm-pin>` to read a DHT22.
    pub dht_helper: String,
}

impl AppSettings {
    pub fn from_env() -> Self {
        let database_url = env::var("DATABASE_URL").ok().or_else(Self::url_from_parts);

        let http_port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        // Mock by default: coming up against real mains relays should be a
        // deliberate act, not a forgotten .env.
        let mock_hardware = !matches!(
            env::var("MOCK_HARDWARE").unwrap_or_default().to_lowercase().as_str(),
            "false" | "0"
        );

        let dht_helper = env::var("DHT_HELPER").unwrap_or_else(|_| "/opt/vivarium/bin/dht-reader".into());

        Self {
            database_url,
            http_port,
            mock_hardware,
            dht_helper,
        }
    }

    /// Assemble a connection string from the discrete `DB_*` variables.
    /// Only kicks in when `DB_HOST` is set, so a bare environment falls
    /// through to the in-memory store.
    fn url_from_parts() -> Option<String> {
        let host = env::var("DB_HOST").ok()?;
        let port = env::var("DB_PORT").unwrap_or_else(|_| "5432".into());
        let user = env::var("DB_USER").unwrap_or_else(|_| "terrarium".into());
        let password = env::var("DB_PASSWORD").unwrap_or_default();
        let dbname = env::var("DB_NAME").unwrap_or_else(|_| "terrarium_db".into());
        Some(format!(
            "postgres://{user}:{password}@{host}:{port}/{dbname}?sslmode=disable"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ClimateConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_inverted_warm_band() {
        let cfg = ClimateConfig {
            warm_target_min: 33.0,
            warm_target_max: 31.5,
            ..ClimateConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_emergency_below_target_max() {
        let cfg = ClimateConfig {
            warm_target_max: 33.0,
            emergency_max_threshold: 32.0,
            ..ClimateConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_hysteresis() {
        let too_small = ClimateConfig {
            hysteresis_temp: 0.05,
            ..ClimateConfig::default()
        };
        assert!(too_small.validate().is_err());

        let too_large = ClimateConfig {
            hysteresis_hum: 20.0,
            ..ClimateConfig::default()
        };
        assert!(too_large.validate().is_err());
    }

    #[test]
    fn rejects_humidity_outside_percent_range() {
        let cfg = ClimateConfig {
            humidity_max: 120.0,
            ..ClimateConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn mode_round_trips_through_text() {
        assert_eq!("AUTO".parse::<Mode>().unwrap(), Mode::Auto);
        assert_eq!("MANUAL".parse::<Mode>().unwrap(), Mode::Manual);
        assert_eq!(Mode::Manual.as_str(), "MANUAL");
        assert!("auto".parse::<Mode>().is_err());
    }
}
