//! Vivarium: terrarium climate-control daemon.
//!
//! Hexagonal layout: the automation core in [`app`] talks to the world
//! only through port traits, implemented by the adapters around it.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                    │
//! │                                                             │
//! │  Dht22Probe / SimSensor    PgStore / MemoryStore            │
//! │  (SensorPort)              (SettingsStore)                  │
//! │  GpioRelayDriver / SimRelayDriver      axum API             │
//! │  (RelayDriver)                         (observer + manual)  │
//! │                                                             │
//! │  ───────────────── Port trait boundary ─────────────────    │
//! │                                                             │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │          ClimateEngine (pure control logic)           │  │
//! │  │  emergency gate · cold-zone gate · hysteresis bands   │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! │                                                             │
//! │  ReadingSnapshot (engine → API) · RelayBank (shared mutex)  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![deny(unused_must_use)]

pub mod api;
pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod hardware;
pub mod pins;
pub mod relay;
pub mod store;
