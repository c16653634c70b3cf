//! Last-reading cache shared with concurrent observers.
//!
//! The engine is the only writer; the HTTP surface reads from arbitrary
//! worker threads. Readings are replaced whole under the lock, so a reader
//! sees either the previous tick or the new one, never a torn mix of the
//! two. Nothing blocks inside the critical section.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};

use crate::app::ports::SensorSample;
use crate::config::Mode;

/// The fused result of one completed tick: both zone samples, the tick
/// instant, and the mode the engine was in.
#[derive(Debug, Clone, Copy)]
pub struct ZoneReading {
    pub warm: SensorSample,
    pub cold: SensorSample,
    pub taken_at: DateTime<Utc>,
    pub mode: Mode,
}

/// Lock-protected cache of the most recent [`ZoneReading`]. Empty until
/// the first successful tick.
#[derive(Default)]
pub struct ReadingSnapshot {
    cell: RwLock<Option<ZoneReading>>,
}

impl ReadingSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached reading atomically.
    pub fn publish(&self, reading: ZoneReading) {
        *self.cell.write().unwrap_or_else(PoisonError::into_inner) = Some(reading);
    }

    /// The most recent reading, if any tick has completed yet.
    pub fn latest(&self) -> Option<ZoneReading> {
        *self.cell.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(temp: f64, hum: f64) -> SensorSample {
        SensorSample {
            temperature_c: temp,
            humidity_pct: hum,
            taken_at: Utc::now(),
        }
    }

    #[test]
    fn empty_until_first_publish() {
        let snapshot = ReadingSnapshot::new();
        assert!(snapshot.latest().is_none());
    }

    #[test]
    fn publish_replaces_the_whole_reading() {
        let snapshot = ReadingSnapshot::new();
        snapshot.publish(ZoneReading {
            warm: sample(32.0, 55.0),
            cold: sample(25.0, 60.0),
            taken_at: Utc::now(),
            mode: Mode::Auto,
        });
        snapshot.publish(ZoneReading {
            warm: sample(33.0, 58.0),
            cold: sample(24.5, 62.0),
            taken_at: Utc::now(),
            mode: Mode::Manual,
        });

        let latest = snapshot.latest().unwrap();
        assert_eq!(latest.warm.temperature_c, 33.0);
        assert_eq!(latest.cold.humidity_pct, 62.0);
        assert_eq!(latest.mode, Mode::Manual);
    }
}
