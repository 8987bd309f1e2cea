use serde::Serialize;

use super::{CongestionPoint, Participant};

/// A topology node: either a capacity constraint or a consumer leaf.
///
/// The tree is closed over these two kinds; all traversal dispatches on the
/// variant.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Node {
    CongestionPoint(CongestionPoint),
    Participant(Participant),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::CongestionPoint(cp) => &cp.id,
            Node::Participant(p) => &p.id,
        }
    }

    pub fn as_congestion_point(&self) -> Option<&CongestionPoint> {
        match self {
            Node::CongestionPoint(cp) => Some(cp),
            Node::Participant(_) => None,
        }
    }

    pub fn as_participant(&self) -> Option<&Participant> {
        match self {
            Node::Participant(p) => Some(p),
            Node::CongestionPoint(_) => None,
        }
    }
}
