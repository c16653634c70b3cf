//! Relay actuation layer.
//!
//! A [`Relay`] pairs a dumb [`RelayDriver`] with the commanded state, which
//! is the only authoritative state in the system; there is no electrical
//! readback from the modules. Commands are idempotent: asking for the
//! current state touches neither the hardware nor the audit trail.
//!
//! Every relay carries its own mutex. In AUTO the control loop is the only
//! writer; in MANUAL the HTTP override path writes too, and the loop's
//! safety gates must still be able to cut power. Serialising both writers
//! on the same lock is what keeps an emergency cutoff from racing a manual
//! switch-on.

use std::fmt;
use std::str::FromStr;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::RelayError;

// ---------------------------------------------------------------------------
// Relay identity
// ---------------------------------------------------------------------------

/// The closed set of switched circuits on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayId {
    HeatMat,
    Fogger,
    Light,
    Spare,
}

impl RelayId {
    pub const ALL: [RelayId; 4] = [Self::HeatMat, Self::Fogger, Self::Light, Self::Spare];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HeatMat => "heat_mat",
            Self::Fogger => "fogger",
            Self::Light => "light",
            Self::Spare => "spare",
        }
    }
}

impl fmt::Display for RelayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a request names a relay outside the closed id set.
#[derive(Debug, Error)]
#[error("unknown relay id: {0}")]
pub struct UnknownRelay(pub String);

impl FromStr for RelayId {
    type Err = UnknownRelay;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heat_mat" => Ok(Self::HeatMat),
            "fogger" => Ok(Self::Fogger),
            "light" => Ok(Self::Light),
            "spare" => Ok(Self::Spare),
            other => Err(UnknownRelay(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Driver port
// ---------------------------------------------------------------------------

/// Write-side port to the physical circuit. `energise` is the appliance
/// state; electrical polarity (active-low modules) is the driver's own
/// concern and never leaks past this trait. Implementations must come up
/// de-energised.
pub trait RelayDriver: Send {
    fn set(&mut self, energise: bool) -> Result<(), RelayError>;
}

// ---------------------------------------------------------------------------
// Relay
// ---------------------------------------------------------------------------

struct Inner {
    driver: Box<dyn RelayDriver>,
    commanded: bool,
}

/// A named, latched actuator. Starts out OFF (drivers initialise the
/// circuit open); the commanded state only advances on a successful
/// driver write, so a failed command is retried by the next evaluation.
pub struct Relay {
    id: RelayId,
    inner: Mutex<Inner>,
}

impl Relay {
    pub fn new(id: RelayId, driver: Box<dyn RelayDriver>) -> Self {
        Self {
            id,
            inner: Mutex::new(Inner {
                driver,
                commanded: false,
            }),
        }
    }

    pub fn id(&self) -> RelayId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.id.as_str()
    }

    /// Energise. Returns `Ok(true)` when the commanded state actually
    /// transitioned, `Ok(false)` for a no-op.
    pub fn on(&self) -> Result<bool, RelayError> {
        self.command(true)
    }

    /// De-energise. Same transition semantics as [`on`](Self::on).
    pub fn off(&self) -> Result<bool, RelayError> {
        self.command(false)
    }

    /// Last successfully commanded state.
    pub fn is_on(&self) -> bool {
        self.lock().commanded
    }

    fn command(&self, energise: bool) -> Result<bool, RelayError> {
        let mut inner = self.lock();
        if inner.commanded == energise {
            return Ok(false);
        }
        inner.driver.set(energise)?;
        inner.commanded = energise;
        Ok(true)
    }

    // The safety gates must keep working even if another writer panicked
    // while holding the lock, so poisoning is recovered, not propagated.
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Relay bank
// ---------------------------------------------------------------------------

/// All four relays, shared between the control loop and the HTTP surface.
pub struct RelayBank {
    pub heat_mat: std::sync::Arc<Relay>,
    pub fogger: std::sync::Arc<Relay>,
    pub light: std::sync::Arc<Relay>,
    pub spare: std::sync::Arc<Relay>,
}

impl RelayBank {
    pub fn get(&self, id: RelayId) -> &std::sync::Arc<Relay> {
        match id {
            RelayId::HeatMat => &self.heat_mat,
            RelayId::Fogger => &self.fogger,
            RelayId::Light => &self.light,
            RelayId::Spare => &self.spare,
        }
    }
}
