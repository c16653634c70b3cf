//! Unified error types for the vivarium daemon.
//!
//! Each subsystem gets its own small enum so the control loop can handle
//! every variant explicitly. None of these are fatal to the loop: sensor
//! and store faults skip work for one tick, relay faults leave the
//! commanded state untouched so the next evaluation retries naturally.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

/// A failed acquisition from one zone probe. Always transient: the tick is
/// skipped and the next tick retries from scratch.
#[derive(Debug, Error)]
pub enum SensorError {
    /// The read did not finish within the acquisition deadline.
    #[error("sensor read timed out")]
    Timeout,

    /// The probe (or its helper process) reported a failure.
    #[error("probe read failed: {0}")]
    Probe(String),

    /// A value outside the physically plausible range was returned.
    #[error("{what} reading out of range: {value}")]
    OutOfRange { what: &'static str, value: f64 },
}

// ---------------------------------------------------------------------------
// Relay errors
// ---------------------------------------------------------------------------

/// A failed actuator command. The commanded state is only updated on
/// success, so a failed command is retried by the next gate evaluation.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("GPIO write failed: {0}")]
    Gpio(String),
}

// ---------------------------------------------------------------------------
// Settings-store errors
// ---------------------------------------------------------------------------

/// A failed settings-store operation. Reads make the loop skip the tick's
/// automation; audit appends are logged and swallowed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store operation timed out")]
    Timeout,

    #[error("store backend error: {0}")]
    Backend(String),
}

// ---------------------------------------------------------------------------
// Configuration validation
// ---------------------------------------------------------------------------

/// A config field failed range or ordering validation. Invalid values are
/// rejected outright, never clamped: a silently narrowed emergency
/// threshold would disable the thermal cutoff without anyone noticing.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The `&'static str` names the field and the violated bound.
    #[error("validation failed: {0}")]
    Invalid(&'static str),
}

// ---------------------------------------------------------------------------
// Hardware construction
// ---------------------------------------------------------------------------

/// Peripheral initialisation failure. Unlike the loop-level errors above
/// these are fatal at startup: a controller with a broken pin map must not
/// come up at all.
#[derive(Debug, Error)]
pub enum InitError {
    /// Two peripherals were mapped to the same BCM pin.
    #[error("GPIO {0} is assigned to more than one peripheral")]
    PinConflict(u8),

    #[error("GPIO init failed: {0}")]
    Gpio(String),
}
