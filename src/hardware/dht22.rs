//! DHT22 zone probe read through a helper process.
//!
//! Bit-banging the DHT22's 1-wire protocol from userspace is unreliable on
//! the Pi 5, so the probe shells out to a small helper (`<helper> <bcm>`)
//! that owns the timing-critical part and prints a single JSON object:
//!
//! ```text
//! {"temperature": 32.1, "humidity": 58.4}
//! {"error": "checksum mismatch"}
//! ```
//!
//! DHT reads fail routinely, so one in-process retry is kept inside the
//! 3 s acquisition deadline. No caching here; the tick-level cache is the
//! reading snapshot.

use std::process::Command;

use chrono::Utc;
use log::debug;
use serde::Deserialize;

use crate::app::ports::{SensorPort, SensorSample};
use crate::error::SensorError;

/// Attempts per acquisition. Two fits the deadline with headroom; the
/// next tick retries from scratch anyway.
const READ_ATTEMPTS: u32 = 2;

pub struct Dht22Probe {
    name: &'static str,
    helper: String,
    pin: u8,
}

#[derive(Debug, Deserialize)]
struct HelperOutput {
    temperature: Option<f64>,
    humidity: Option<f64>,
    error: Option<String>,
}

impl Dht22Probe {
    pub fn new(name: &'static str, helper: &str, pin: u8) -> Self {
        Self {
            name,
            helper: helper.to_string(),
            pin,
        }
    }

    fn read_once(&self) -> Result<SensorSample, SensorError> {
        let output = Command::new(&self.helper)
            .arg(self.pin.to_string())
            .output()
            .map_err(|e| SensorError::Probe(format!("helper spawn failed: {e}")))?;

        let (temperature_c, humidity_pct) = parse_helper_output(&output.stdout)?;
        Ok(SensorSample {
            temperature_c,
            humidity_pct,
            taken_at: Utc::now(),
        })
    }
}

impl SensorPort for Dht22Probe {
    fn read(&self) -> Result<SensorSample, SensorError> {
        let mut last = None;
        for attempt in 1..=READ_ATTEMPTS {
            match self.read_once() {
                Ok(sample) => return Ok(sample),
                Err(e) => {
                    debug!("{} attempt {attempt}/{READ_ATTEMPTS} failed: {e}", self.name);
                    last = Some(e);
                }
            }
        }
        Err(last.unwrap_or(SensorError::Probe("no read attempted".into())))
    }

    fn name(&self) -> &str {
        self.name
    }
}

/// Decode the helper's JSON. A reported error, a missing value, or an
/// implausible humidity all count as a transient fault.
fn parse_helper_output(stdout: &[u8]) -> Result<(f64, f64), SensorError> {
    let parsed: HelperOutput = serde_json::from_slice(stdout)
        .map_err(|e| SensorError::Probe(format!("helper output is not valid JSON: {e}")))?;

    if let Some(message) = parsed.error {
        return Err(SensorError::Probe(message));
    }

    let (Some(temperature), Some(humidity)) = (parsed.temperature, parsed.humidity) else {
        return Err(SensorError::Probe("helper returned no reading".into()));
    };

    if !(0.0..=100.0).contains(&humidity) {
        return Err(SensorError::OutOfRange {
            what: "humidity",
            value: humidity,
        });
    }

    Ok((temperature, humidity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_good_reading() {
        let (t, h) = parse_helper_output(br#"{"temperature": 32.1, "humidity": 58.4}"#).unwrap();
        assert_eq!(t, 32.1);
        assert_eq!(h, 58.4);
    }

    #[test]
    fn helper_error_becomes_probe_fault() {
        let err = parse_helper_output(br#"{"error": "checksum mismatch"}"#).unwrap_err();
        assert!(matches!(err, SensorError::Probe(m) if m == "checksum mismatch"));
    }

    #[test]
    fn missing_values_are_a_fault() {
        assert!(parse_helper_output(br#"{"temperature": 32.1}"#).is_err());
    }

    #[test]
    fn junk_output_is_a_fault() {
        assert!(parse_helper_output(b"Traceback (most recent call last):").is_err());
    }

    #[test]
    fn implausible_humidity_is_rejected() {
        let err = parse_helper_output(br#"{"temperature": 30.0, "humidity": 130.0}"#).unwrap_err();
        assert!(matches!(err, SensorError::OutOfRange { .. }));
    }
}
