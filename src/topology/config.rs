use serde::Deserialize;
use std::collections::HashMap;

/// On-disk topology description: a forest of congestion points with nested
/// points and participant leaves.
#[derive(Debug, Clone, Deserialize)]
pub struct TopologyConfig {
    #[serde(alias = "congestionPoints")]
    pub congestion_points: Vec<NodeConfig>,
}

/// A node is a congestion point when it carries the switching/release
/// thresholds; otherwise it is a participant leaf.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NodeConfig {
    CongestionPoint(CongestionPointConfig),
    Participant(ParticipantConfig),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CongestionPointConfig {
    pub id: String,
    #[serde(default)]
    pub level: u32,
    #[serde(alias = "upperLimit", alias = "switchingThreshold", alias = "switching_threshold")]
    pub upper_limit: f64,
    #[serde(alias = "releaseLimit", alias = "releaseThreshold", alias = "release_threshold")]
    pub release_limit: f64,
    #[serde(default)]
    pub children: Vec<NodeConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParticipantConfig {
    pub id: String,
    pub base: f64,
    pub flex: f64,
    /// Accepted under several historical spellings; defaults to 1 and is
    /// truncated towards zero before the >= 1 floor is applied.
    #[serde(
        default,
        alias = "releaseAfterCycles",
        alias = "releaseAfterCyclus",
        alias = "releaseDelayCycles",
        alias = "release_delay_cycles"
    )]
    pub release_after_cycles: Option<f64>,
}

impl ParticipantConfig {
    /// Release delay in whole cycles, truncated and floored to at least 1.
    pub fn release_delay(&self) -> u32 {
        let raw = self.release_after_cycles.unwrap_or(1.0).trunc();
        if raw < 1.0 {
            1
        } else {
            raw as u32
        }
    }
}

/// Per-cycle measurement input: two id-keyed maps, one per node kind.
/// Entries for unknown ids or ids of the wrong kind are silently dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeasurementInput {
    #[serde(default, alias = "congestionPoints")]
    pub congestion_points: HashMap<String, f64>,
    #[serde(default)]
    pub participants: HashMap<String, f64>,
}
