//! Human-readable cycle reporting for the demo driver.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::controller::CycleOutcome;
use crate::domain::CongestionState;
use crate::topology::{NodeConfig, Topology, TopologyConfig};

/// Render a per-cycle overview: every congestion point with its outcome, then
/// every participant with its setpoint and the points responsible for it.
pub fn render_cycle(
    title: &str,
    topology: &Topology,
    outcomes: &HashMap<String, CycleOutcome>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "Congestion points:");

    for cp_id in topology.congestion_point_ids() {
        let Some(cp) = topology.congestion_point(&cp_id) else {
            continue;
        };
        let label = outcomes.get(&cp_id).map_or("NO_CHANGE", |o| o.label());
        let mode = match cp.state {
            CongestionState::Free => "releasing",
            CongestionState::Congested => "congested",
        };
        let _ = writeln!(
            out,
            "  {id} measurement {m:>6.1}  {label:<17} overload {overload:>6.1}  limits {upper:>6.1}/{release:>6.1}  [{mode}]",
            id = cp.id,
            m = cp.measurement,
            overload = cp.overload(),
            upper = cp.upper_limit,
            release = cp.release_limit,
        );
    }

    let _ = writeln!(out, "Participants:");
    for participant_id in topology.participant_ids() {
        let Some(p) = topology.participant(&participant_id) else {
            continue;
        };
        let setpoint_label = if p.setpoint == p.base {
            "base"
        } else if p.setpoint == p.base + p.flex_contract {
            "base+flex"
        } else {
            "other"
        };
        let restricted_by = p
            .active_restrictions
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            out,
            "  {id} base {base:>6.1}  flex {flex:>6.1}  measurement {m:>6.1}  setpoint {sp:>6.1} ({setpoint_label}); restricted by: {restricted_by}",
            id = p.id,
            base = p.base,
            flex = p.flex_contract,
            m = p.measurement,
            sp = p.setpoint,
        );
    }

    out
}

/// Render the topology description as an indented tree.
pub fn render_topology(cfg: &TopologyConfig) -> String {
    fn render_node(node: &NodeConfig, indent: usize, out: &mut String) {
        let pad = "  ".repeat(indent);
        match node {
            NodeConfig::CongestionPoint(cp) => {
                let _ = writeln!(
                    out,
                    "{pad}- {} (level {}, limit {}, release {})",
                    cp.id, cp.level, cp.upper_limit, cp.release_limit
                );
                for child in &cp.children {
                    render_node(child, indent + 1, out);
                }
            }
            NodeConfig::Participant(p) => {
                let _ = writeln!(out, "{pad}- {} (base {}, flex {})", p.id, p.base, p.flex);
            }
        }
    }

    let mut out = String::from("Topology:\n");
    for root in &cfg.congestion_points {
        render_node(root, 0, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CongestionPoint, Participant};

    #[test]
    fn cycle_report_labels_setpoints() {
        let mut topology = Topology::new();
        topology
            .insert_root(CongestionPoint::new("CP_1", 0, 50.0, 40.0))
            .unwrap();
        let mut p = Participant::new("P_1", 10.0, 5.0, 1);
        p.active_restrictions.insert("CP_1".to_string());
        p.recompute_setpoint();
        topology.insert_participant("CP_1", p).unwrap();

        let report = render_cycle("Cycle 1", &topology, &HashMap::new());
        assert!(report.contains("CP_1"));
        assert!(report.contains("(base)"));
        assert!(report.contains("restricted by: CP_1"));
    }

    #[test]
    fn topology_report_indents_nested_points() {
        let cfg: TopologyConfig = serde_json::from_str(
            r#"{
                "congestion_points": [
                    {
                        "id": "CP_1", "level": 0, "upper_limit": 50, "release_limit": 40,
                        "children": [{ "id": "P_1", "base": 10, "flex": 5 }]
                    }
                ]
            }"#,
        )
        .unwrap();

        let rendered = render_topology(&cfg);
        assert!(rendered.contains("- CP_1 (level 0, limit 50, release 40)"));
        assert!(rendered.contains("  - P_1 (base 10, flex 5)"));
    }
}
