//! Property tests for the control-loop invariants: emergency dominance,
//! mode isolation, hysteresis monotonicity, idempotent commands.
//!
//! Each case builds its own single-threaded runtime and drives the engine
//! tick by tick against mock hardware with arbitrary reading sequences.

mod common;

use common::{audit_trail, recording_relay, rig, Rig};

use proptest::prelude::*;
use tokio::runtime::Runtime;

use vivarium::app::events::SwitchReason;
use vivarium::app::ports::SettingsStore;
use vivarium::config::{ClimateConfig, Mode};
use vivarium::relay::RelayId;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("test runtime")
}

/// One tick's worth of arbitrary zone readings.
#[derive(Debug, Clone, Copy)]
struct Readings {
    warm_temp: f64,
    warm_hum: f64,
    cold_temp: f64,
}

fn arb_readings() -> impl Strategy<Value = Readings> {
    (15.0f64..45.0, 0.0f64..100.0, 15.0f64..35.0).prop_map(|(warm_temp, warm_hum, cold_temp)| {
        Readings {
            warm_temp,
            warm_hum,
            cold_temp,
        }
    })
}

fn apply(rig: &Rig, r: Readings) {
    rig.warm.set(r.warm_temp, r.warm_hum);
    rig.cold.set(r.cold_temp, 60.0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Emergency dominance: whenever a tick observes the warm zone at or above the
    /// emergency threshold, that tick ends with heat mat, fogger, and
    /// light all OFF, in either mode, from any prior state.
    #[test]
    fn emergency_always_dominates(
        sequence in proptest::collection::vec(arb_readings(), 1..25),
        manual in proptest::bool::ANY,
        heat0 in proptest::bool::ANY,
        fog0 in proptest::bool::ANY,
        light0 in proptest::bool::ANY,
    ) {
        runtime().block_on(async {
            let mut rig = rig();
            if manual {
                rig.store.set_mode(Mode::Manual).await.unwrap();
            }
            if heat0 { rig.heat_mat.on().unwrap(); }
            if fog0 { rig.fogger.on().unwrap(); }
            if light0 { rig.light.on().unwrap(); }

            let emergency = ClimateConfig::default().emergency_max_threshold;
            for r in sequence {
                apply(&rig, r);
                rig.engine.tick().await;
                if r.warm_temp >= emergency {
                    prop_assert!(!rig.heat_mat.is_on(), "heat on after emergency tick");
                    prop_assert!(!rig.fogger.is_on(), "fogger on after emergency tick");
                    prop_assert!(!rig.light.is_on(), "light on after emergency tick");
                }
            }
            Ok(())
        })?;
    }

    /// Mode isolation: in MANUAL the core commands relays only through the safety
    /// gates, so every audit entry carries a safety reason and nothing is
    /// ever switched ON.
    #[test]
    fn manual_mode_only_allows_safety_commands(
        sequence in proptest::collection::vec(arb_readings(), 1..25),
        heat0 in proptest::bool::ANY,
    ) {
        runtime().block_on(async {
            let mut rig = rig();
            rig.store.set_mode(Mode::Manual).await.unwrap();
            if heat0 { rig.heat_mat.on().unwrap(); }

            for r in sequence {
                apply(&rig, r);
                rig.engine.tick().await;
            }

            for entry in audit_trail(&rig.store).await {
                prop_assert!(
                    matches!(
                        entry.reason,
                        SwitchReason::EmergencyCutoff | SwitchReason::ColdZoneProtection
                    ),
                    "non-safety reason {} in MANUAL",
                    entry.reason
                );
                prop_assert!(!entry.state, "core energised a relay in MANUAL");
            }
            Ok(())
        })?;
    }

    /// Heating transitions never chatter: an ON at temperature x
    /// followed by the next OFF at temperature y always spans at least the
    /// target spread plus twice the hysteresis.
    #[test]
    fn heating_transitions_span_the_full_band(
        temps in proptest::collection::vec(15.0f64..34.9, 2..40),
    ) {
        runtime().block_on(async {
            let cfg = ClimateConfig::default();
            let min_swing = (cfg.warm_target_max - cfg.warm_target_min) + 2.0 * cfg.hysteresis_temp;

            let mut rig = rig();
            let mut last_on_temp: Option<f64> = None;
            let mut seen = 0usize;

            for temp in temps {
                rig.warm.set(temp, 58.0);
                rig.cold.set(24.0, 60.0);
                rig.engine.tick().await;

                let trail = audit_trail(&rig.store).await;
                for entry in &trail[seen..] {
                    if entry.relay_id != RelayId::HeatMat {
                        continue;
                    }
                    if entry.state {
                        last_on_temp = Some(temp);
                    } else if let Some(on_temp) = last_on_temp.take() {
                        prop_assert!(
                            temp - on_temp >= min_swing - 1e-9,
                            "chatter: ON at {on_temp}, OFF at {temp}"
                        );
                    }
                }
                seen = trail.len();
            }
            Ok(())
        })?;
    }

    /// Commanding a relay into the state it already holds touches
    /// neither the driver nor the audit trail.
    #[test]
    fn idempotent_commands_write_once(commands in proptest::collection::vec(proptest::bool::ANY, 1..50)) {
        let (relay, writes, _) = recording_relay(RelayId::Spare);

        let mut expected = Vec::new();
        let mut state = false;
        for command in commands {
            let transitioned = if command { relay.on() } else { relay.off() }.unwrap();
            prop_assert_eq!(transitioned, command != state);
            if command != state {
                expected.push(command);
                state = command;
            }
        }
        prop_assert_eq!(&*writes.lock().unwrap(), &expected);
    }
}
