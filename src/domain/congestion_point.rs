use serde::Serialize;

/// Hysteresis state of a congestion point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CongestionState {
    Free,
    Congested,
}

impl std::fmt::Display for CongestionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CongestionState::Free => write!(f, "FREE"),
            CongestionState::Congested => write!(f, "CONGESTED"),
        }
    }
}

/// A capacity constraint node in the grid topology.
///
/// Congestion is entered above `upper_limit` and only exited again below
/// `release_limit`; the gap between the two is the hysteresis dead band that
/// keeps the state from oscillating around a single threshold.
#[derive(Debug, Clone, Serialize)]
pub struct CongestionPoint {
    pub id: String,
    /// Depth in the topology, informational only.
    pub level: u32,
    /// Threshold above which congestion is entered/maintained.
    pub upper_limit: f64,
    /// Threshold below which congestion is exited. Must sit below
    /// `upper_limit` for the dead band to exist.
    pub release_limit: f64,

    /// Externally supplied measurement, overwritten per cycle.
    pub measurement: f64,
    pub state: CongestionState,
    /// Child node ids (nested congestion points or participants). Edges are
    /// id references into the topology table, never owned subtrees.
    pub children: Vec<String>,
}

impl CongestionPoint {
    pub fn new(id: impl Into<String>, level: u32, upper_limit: f64, release_limit: f64) -> Self {
        Self {
            id: id.into(),
            level,
            upper_limit,
            release_limit,
            measurement: 0.0,
            state: CongestionState::Free,
            children: Vec::new(),
        }
    }

    /// Current overload above the switching threshold, never negative.
    pub fn overload(&self) -> f64 {
        (self.measurement - self.upper_limit).max(0.0)
    }
}
