//! Device-backed relay driver for the Pi's GPIO header.
//!
//! The relay boards in this build are active-low: driving the pin LOW
//! closes the circuit. Construction therefore claims the pin with its
//! output already HIGH, so the controlled appliance is de-energised from
//! the first electrical instant, not after the first `set` call. That
//! polarity never leaves this module.

use rppal::gpio::{Gpio, OutputPin};

use crate::error::{InitError, RelayError};
use crate::relay::RelayDriver;

pub struct GpioRelayDriver {
    pin: OutputPin,
}

impl GpioRelayDriver {
    pub fn new(gpio: &Gpio, bcm: u8) -> Result<Self, InitError> {
        let pin = gpio
            .get(bcm)
            .map_err(|e| InitError::Gpio(format!("BCM {bcm}: {e}")))?
            .into_output_high();
        Ok(Self { pin })
    }
}

impl RelayDriver for GpioRelayDriver {
    fn set(&mut self, energise: bool) -> Result<(), RelayError> {
        if energise {
            self.pin.set_low();
        } else {
            self.pin.set_high();
        }
        Ok(())
    }
}
