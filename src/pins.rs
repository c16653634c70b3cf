//! BCM pin assignments for the Raspberry Pi main board.
//!
//! Single source of truth: hardware construction reads this map rather
//! than hard-coding pin numbers. [`PinMap::validate`] refuses overlapping
//! assignments: a pin shared between a sensor and a relay fails at startup
//! instead of producing garbage reads against an energised output.

use crate::error::InitError;

/// BCM pin numbers for every peripheral the controller drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinMap {
    /// Warm-zone DHT22 data pin.
    pub warm_sensor: u8,
    /// Cold-zone DHT22 data pin.
    pub cold_sensor: u8,
    pub heat_mat: u8,
    pub fogger: u8,
    pub light: u8,
    pub spare: u8,
}

impl Default for PinMap {
    fn default() -> Self {
        Self {
            warm_sensor: 4,
            cold_sensor: 17,
            heat_mat: 22,
            fogger: 23,
            light: 24,
            spare: 25,
        }
    }
}

impl PinMap {
    /// Reject maps where any two peripherals share a pin.
    pub fn validate(&self) -> Result<(), InitError> {
        let pins = [
            self.warm_sensor,
            self.cold_sensor,
            self.heat_mat,
            self.fogger,
            self.light,
            self.spare,
        ];
        for (i, pin) in pins.iter().enumerate() {
            if pins[i + 1..].contains(pin) {
                return Err(InitError::PinConflict(*pin));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_map_has_no_conflicts() {
        assert!(PinMap::default().validate().is_ok());
    }

    #[test]
    fn shared_pin_is_refused() {
        // A sensor and a relay on the same pin must not construct.
        let map = PinMap {
            cold_sensor: 17,
            light: 17,
            ..PinMap::default()
        };
        match map.validate() {
            Err(InitError::PinConflict(17)) => {}
            other => panic!("expected PinConflict(17), got {other:?}"),
        }
    }
}
