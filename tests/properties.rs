//! Property tests for the engine invariants.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use grid_congestion_controller::controller::{
    intervention_priority, release_on_point, restrict_on_point,
};
use grid_congestion_controller::domain::{CongestionPoint, Participant};
use grid_congestion_controller::events::NullSink;
use grid_congestion_controller::topology::Topology;

#[derive(Debug, Clone)]
struct ParticipantSpec {
    base: f64,
    flex: f64,
    measurement: f64,
}

fn participant_spec() -> impl Strategy<Value = ParticipantSpec> {
    (0.0..50.0f64, 0.0..30.0f64, 0.0..100.0f64).prop_map(|(base, flex, measurement)| {
        ParticipantSpec {
            base,
            flex,
            measurement,
        }
    })
}

fn build_topology(cp_measurement: f64, specs: &[ParticipantSpec]) -> Topology {
    let mut cp = CongestionPoint::new("CP_PROP", 0, 50.0, 40.0);
    cp.measurement = cp_measurement;
    let mut topology = Topology::new();
    topology.insert_root(cp).unwrap();
    for (i, spec) in specs.iter().enumerate() {
        let mut p = Participant::new(format!("P_{i}"), spec.base, spec.flex, 1);
        p.measurement = spec.measurement;
        topology.insert_participant("CP_PROP", p).unwrap();
    }
    topology
}

fn assert_setpoint_invariant(topology: &Topology) {
    for id in topology.participant_ids() {
        let p = topology.participant(&id).unwrap();
        let expected = if p.active_restrictions.is_empty() {
            p.base + p.flex_contract
        } else {
            p.base
        };
        assert_eq!(p.setpoint, expected, "setpoint invariant broken for {id}");
    }
}

proptest! {
    #[test]
    fn restriction_preserves_setpoint_invariant_and_never_grows_overload(
        specs in prop::collection::vec(participant_spec(), 0..8),
        cp_measurement in 0.0..200.0f64,
    ) {
        let mut topology = build_topology(cp_measurement, &specs);
        let now = Utc.timestamp_millis_opt(1_000).unwrap();

        let outcome = restrict_on_point(&mut topology, "CP_PROP", now, &mut NullSink).unwrap();

        let initial_overload = (cp_measurement - 50.0).max(0.0);
        prop_assert!(outcome.remaining >= 0.0);
        prop_assert!(outcome.remaining <= initial_overload);
        assert_setpoint_invariant(&topology);
    }

    #[test]
    fn restrict_then_release_round_trips_the_setpoints(
        specs in prop::collection::vec(participant_spec(), 1..8),
        cp_measurement in 51.0..200.0f64,
    ) {
        let mut topology = build_topology(cp_measurement, &specs);
        let now = Utc.timestamp_millis_opt(1_000).unwrap();
        restrict_on_point(&mut topology, "CP_PROP", now, &mut NullSink).unwrap();

        // Let every countdown elapse, then release without a budget cap.
        for id in topology.participant_ids() {
            topology.participant_mut(&id).unwrap().tick_release_countdowns();
        }
        let later = Utc.timestamp_millis_opt(2_000).unwrap();
        release_on_point(
            &mut topology,
            "CP_PROP",
            later,
            intervention_priority,
            f64::INFINITY,
            &mut NullSink,
        )
        .unwrap();

        for id in topology.participant_ids() {
            let p = topology.participant(&id).unwrap();
            prop_assert!(p.active_restrictions.is_empty());
            prop_assert_eq!(p.setpoint, p.base + p.flex_contract);
            prop_assert!(p.release_countdown_by_cp.is_empty());
        }
        assert_setpoint_invariant(&topology);
    }
}
