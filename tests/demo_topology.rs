//! Tests against the shipped demo topology and measurement files.

use chrono::Utc;
use std::path::Path;

use grid_congestion_controller::controller::{run_control_cycle, CycleOutcome};
use grid_congestion_controller::domain::CongestionState;
use grid_congestion_controller::events::NullSink;
use grid_congestion_controller::topology::{MeasurementInput, Topology, TopologyConfig};

fn load_json<T: serde::de::DeserializeOwned>(relative: &str) -> T {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(relative);
    let raw = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("reading {}: {e}", path.display()));
    serde_json::from_str(&raw).unwrap_or_else(|e| panic!("parsing {}: {e}", path.display()))
}

fn demo_topology() -> Topology {
    let cfg: TopologyConfig = load_json("config/topology.json");
    Topology::from_config(&cfg).unwrap()
}

#[test]
fn demo_topology_has_three_root_points() {
    let cfg: TopologyConfig = load_json("config/topology.json");
    let topology = Topology::from_config(&cfg).unwrap();
    assert_eq!(topology.roots(), ["CP_01", "CP_02", "CP_03"]);
}

#[test]
fn nested_point_participants_are_collected_recursively() {
    let topology = demo_topology();
    let mut ids: Vec<&str> = topology
        .participants_under("CP_03")
        .iter()
        .map(|p| p.id.as_str())
        .collect();
    ids.sort();
    assert_eq!(ids, ["P_131", "P_132", "P_133", "P_301"]);
}

#[test]
fn configured_release_delay_is_honored() {
    let topology = demo_topology();
    assert_eq!(topology.participant("P_112").unwrap().release_after_cycles, 2);
    assert_eq!(topology.participant("P_111").unwrap().release_after_cycles, 1);
}

#[test]
fn first_measurement_set_congests_only_the_nested_point() {
    let mut topology = demo_topology();
    let measurements: MeasurementInput = load_json("input/measurements_cycle1.json");
    topology.apply_measurements(&measurements);

    let cp_ids = topology.congestion_point_ids();
    let outcomes = run_control_cycle(&mut topology, &cp_ids, Utc::now(), &mut NullSink).unwrap();

    assert!(matches!(
        outcomes["CP_11"],
        CycleOutcome::EnterCongestion { .. }
    ));
    for cp_id in ["CP_01", "CP_02", "CP_03", "CP_13"] {
        assert_eq!(outcomes[cp_id], CycleOutcome::NoChange { remaining: 0.0 });
    }

    assert_eq!(
        topology.congestion_point("CP_11").unwrap().state,
        CongestionState::Congested
    );
    // Largest flex users under CP_11 are clamped; the overload of 17 is
    // covered by P_113 (15) and P_112 (6).
    assert_eq!(topology.participant("P_113").unwrap().setpoint, 10.0);
    assert_eq!(topology.participant("P_112").unwrap().setpoint, 10.0);
    assert_eq!(topology.participant("P_111").unwrap().setpoint, 15.0);
}

#[test]
fn second_measurement_set_starts_releasing_with_delay() {
    let mut topology = demo_topology();
    let cp_ids = topology.congestion_point_ids();

    let cycle1: MeasurementInput = load_json("input/measurements_cycle1.json");
    topology.apply_measurements(&cycle1);
    run_control_cycle(&mut topology, &cp_ids, Utc::now(), &mut NullSink).unwrap();

    let cycle2: MeasurementInput = load_json("input/measurements_cycle2.json");
    topology.apply_measurements(&cycle2);
    let outcomes = run_control_cycle(&mut topology, &cp_ids, Utc::now(), &mut NullSink).unwrap();

    // CP_11 drops below its release limit and exits congestion. P_113
    // (delay 1) comes back up immediately; P_112 (delay 2) stays gated.
    match &outcomes["CP_11"] {
        CycleOutcome::ExitCongestion { changed } => {
            assert_eq!(changed.len(), 1);
            assert_eq!(changed[0].id, "P_113");
        }
        other => panic!("expected EXIT_CONGESTION, got {other:?}"),
    }
    assert_eq!(topology.participant("P_113").unwrap().setpoint, 25.0);
    assert_eq!(topology.participant("P_112").unwrap().setpoint, 10.0);

    // One more cycle lets P_112 go as well.
    let outcomes = run_control_cycle(&mut topology, &cp_ids, Utc::now(), &mut NullSink).unwrap();
    assert!(matches!(
        outcomes["CP_11"],
        CycleOutcome::ReleaseProgress { .. }
    ));
    assert_eq!(topology.participant("P_112").unwrap().setpoint, 20.0);
}
