use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use grid_congestion_controller::config::Config;
use grid_congestion_controller::controller::run_control_cycle;
use grid_congestion_controller::events::{SetpointBus, UdpBroadcaster};
use grid_congestion_controller::report;
use grid_congestion_controller::telemetry::init_tracing;
use grid_congestion_controller::topology::{MeasurementInput, Topology, TopologyConfig};

fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::load()?;

    let topology_cfg: TopologyConfig = load_json(&cfg.demo.topology_path)?;
    print!("{}", report::render_topology(&topology_cfg));

    let mut topology = Topology::from_config(&topology_cfg)?;
    let cp_ids = topology.congestion_point_ids();
    info!(
        congestion_points = cp_ids.len(),
        participants = topology.participant_ids().len(),
        "topology built"
    );

    let mut bus = SetpointBus::new();
    bus.subscribe(|event| {
        info!(
            participant = %event.participant_id,
            congestion_point = %event.congestion_point_id,
            reason = ?event.reason,
            old_setpoint = event.old_setpoint,
            new_setpoint = event.new_setpoint,
            "setpoint changed"
        );
    });
    let mut sink = UdpBroadcaster::new(bus, &cfg.events);

    for (index, path) in cfg.demo.measurement_paths.iter().enumerate() {
        let measurements: MeasurementInput = load_json(path)?;
        topology.apply_measurements(&measurements);

        let outcomes = run_control_cycle(&mut topology, &cp_ids, Utc::now(), &mut sink)?;

        let title = format!("Cycle {} ({path}):", index + 1);
        print!("{}", report::render_cycle(&title, &topology, &outcomes));
        println!("---");
    }

    Ok(())
}

fn load_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))
}
