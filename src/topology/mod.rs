pub mod config;

pub use config::{CongestionPointConfig, MeasurementInput, NodeConfig, ParticipantConfig, TopologyConfig};

use std::collections::HashMap;
use thiserror::Error;
use tracing::warn;

use crate::domain::{CongestionPoint, Node, Participant};

#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("duplicate topology node id: {0}")]
    DuplicateNodeId(String),

    #[error("unknown parent node: {0}")]
    UnknownParent(String),

    #[error("parent node is not a congestion point: {0}")]
    ParentNotCongestionPoint(String),
}

/// The entity graph: one id-indexed table holding every node, owned by the
/// orchestrator. Parent/child edges are id references into this table, so a
/// participant shared by several congestion points exists exactly once and
/// every mutation has a single unambiguous owner.
#[derive(Debug, Default)]
pub struct Topology {
    nodes: HashMap<String, Node>,
    roots: Vec<String>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the full graph from a topology description. A duplicate id
    /// anywhere rejects the whole topology; no partial graph is usable.
    pub fn from_config(cfg: &TopologyConfig) -> Result<Self, TopologyError> {
        let mut topology = Self::new();
        for root in &cfg.congestion_points {
            topology.build_node(None, root)?;
        }
        Ok(topology)
    }

    fn build_node(&mut self, parent: Option<&str>, cfg: &NodeConfig) -> Result<(), TopologyError> {
        match cfg {
            NodeConfig::CongestionPoint(cp_cfg) => {
                if cp_cfg.release_limit >= cp_cfg.upper_limit {
                    warn!(
                        id = %cp_cfg.id,
                        upper_limit = cp_cfg.upper_limit,
                        release_limit = cp_cfg.release_limit,
                        "release limit is not below upper limit; hysteresis dead band is empty"
                    );
                }
                let cp = CongestionPoint::new(
                    &cp_cfg.id,
                    cp_cfg.level,
                    cp_cfg.upper_limit,
                    cp_cfg.release_limit,
                );
                match parent {
                    None => self.insert_root(cp)?,
                    Some(parent_id) => self.insert_child_point(parent_id, cp)?,
                }
                for child in &cp_cfg.children {
                    self.build_node(Some(&cp_cfg.id), child)?;
                }
            }
            NodeConfig::Participant(p_cfg) => {
                let participant =
                    Participant::new(&p_cfg.id, p_cfg.base, p_cfg.flex, p_cfg.release_delay());
                match parent {
                    None => self.register(Node::Participant(participant))?,
                    Some(parent_id) => self.insert_participant(parent_id, participant)?,
                }
            }
        }
        Ok(())
    }

    fn register(&mut self, node: Node) -> Result<(), TopologyError> {
        let id = node.id().to_string();
        if self.nodes.contains_key(&id) {
            return Err(TopologyError::DuplicateNodeId(id));
        }
        self.nodes.insert(id, node);
        Ok(())
    }

    fn ensure_parent(&self, parent_id: &str) -> Result<(), TopologyError> {
        match self.nodes.get(parent_id) {
            None => Err(TopologyError::UnknownParent(parent_id.to_string())),
            Some(Node::Participant(_)) => {
                Err(TopologyError::ParentNotCongestionPoint(parent_id.to_string()))
            }
            Some(Node::CongestionPoint(_)) => Ok(()),
        }
    }

    fn attach_child(&mut self, parent_id: &str, child_id: String) {
        if let Some(Node::CongestionPoint(cp)) = self.nodes.get_mut(parent_id) {
            cp.children.push(child_id);
        }
    }

    /// Register a top-level congestion point.
    pub fn insert_root(&mut self, cp: CongestionPoint) -> Result<(), TopologyError> {
        let id = cp.id.clone();
        self.register(Node::CongestionPoint(cp))?;
        self.roots.push(id);
        Ok(())
    }

    /// Register a nested congestion point under an existing one.
    pub fn insert_child_point(
        &mut self,
        parent_id: &str,
        cp: CongestionPoint,
    ) -> Result<(), TopologyError> {
        self.ensure_parent(parent_id)?;
        let id = cp.id.clone();
        self.register(Node::CongestionPoint(cp))?;
        self.attach_child(parent_id, id);
        Ok(())
    }

    /// Register a participant leaf under an existing congestion point.
    pub fn insert_participant(
        &mut self,
        parent_id: &str,
        participant: Participant,
    ) -> Result<(), TopologyError> {
        self.ensure_parent(parent_id)?;
        let id = participant.id.clone();
        self.register(Node::Participant(participant))?;
        self.attach_child(parent_id, id);
        Ok(())
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn congestion_point(&self, id: &str) -> Option<&CongestionPoint> {
        self.nodes.get(id).and_then(Node::as_congestion_point)
    }

    pub fn congestion_point_mut(&mut self, id: &str) -> Option<&mut CongestionPoint> {
        match self.nodes.get_mut(id) {
            Some(Node::CongestionPoint(cp)) => Some(cp),
            _ => None,
        }
    }

    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.nodes.get(id).and_then(Node::as_participant)
    }

    pub fn participant_mut(&mut self, id: &str) -> Option<&mut Participant> {
        match self.nodes.get_mut(id) {
            Some(Node::Participant(p)) => Some(p),
            _ => None,
        }
    }

    /// All congestion point ids, sorted for stable iteration.
    pub fn congestion_point_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .nodes
            .values()
            .filter_map(|n| n.as_congestion_point().map(|cp| cp.id.clone()))
            .collect();
        ids.sort();
        ids
    }

    /// All participant ids, sorted for stable iteration.
    pub fn participant_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .nodes
            .values()
            .filter_map(|n| n.as_participant().map(|p| p.id.clone()))
            .collect();
        ids.sort();
        ids
    }

    /// All participant descendants of a congestion point, recursively through
    /// nested points, in child order.
    pub fn participants_under(&self, cp_id: &str) -> Vec<&Participant> {
        let mut out = Vec::new();
        self.collect_participants(cp_id, &mut out);
        out
    }

    fn collect_participants<'a>(&'a self, id: &str, out: &mut Vec<&'a Participant>) {
        match self.nodes.get(id) {
            Some(Node::Participant(p)) => out.push(p),
            Some(Node::CongestionPoint(cp)) => {
                for child in &cp.children {
                    self.collect_participants(child, out);
                }
            }
            None => {}
        }
    }

    /// Overwrite measurements from an external input set. Unknown ids and
    /// ids of the wrong node kind are dropped without touching the rest.
    pub fn apply_measurements(&mut self, input: &MeasurementInput) {
        for (id, measurement) in &input.congestion_points {
            if let Some(cp) = self.congestion_point_mut(id) {
                cp.measurement = *measurement;
            }
        }
        for (id, measurement) in &input.participants {
            if let Some(p) = self.participant_mut(id) {
                p.measurement = *measurement;
            }
        }
    }
}
