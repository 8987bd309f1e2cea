pub mod ordering;
pub mod release;
pub mod restriction;
pub mod state_machine;

pub use ordering::{intervention_priority, ParticipantOrder};
pub use release::{
    has_pending_restrictions, release_budget, release_on_point, ReleaseOutcome,
    ReleasedParticipant,
};
pub use restriction::{restrict_on_point, RestrictOutcome, RestrictedParticipant};
pub use state_machine::{evaluate_point, CycleOutcome};

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::debug;

use crate::events::SetpointSink;
use crate::topology::Topology;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("unknown congestion point id: {0}")]
    UnknownCongestionPoint(String),
}

/// Participant ids under a congestion point, sorted by the given policy.
/// Ties keep child order (the sort is stable).
pub(crate) fn sorted_participant_ids(
    topology: &Topology,
    cp_id: &str,
    order: ParticipantOrder,
) -> Vec<String> {
    let mut participants = topology.participants_under(cp_id);
    participants.sort_by(|a, b| order(a, b));
    participants.into_iter().map(|p| p.id.clone()).collect()
}

/// Decrement the release countdowns of every distinct participant under the
/// given congestion points, exactly once each, no matter how many points
/// reference it.
pub fn tick_release_countdowns(topology: &mut Topology, cp_ids: &[String]) {
    let mut seen: HashSet<String> = HashSet::new();
    for cp_id in cp_ids {
        for participant in topology.participants_under(cp_id) {
            seen.insert(participant.id.clone());
        }
    }
    for participant_id in seen {
        if let Some(p) = topology.participant_mut(&participant_id) {
            p.tick_release_countdowns();
        }
    }
}

/// Run one control cycle: tick countdowns first, then evaluate every
/// congestion point in the caller-supplied order.
///
/// A participant shared by several points means that order decides whose
/// restriction or release lands first within the cycle; it is a caller
/// contract, not engine nondeterminism.
pub fn run_control_cycle(
    topology: &mut Topology,
    cp_ids: &[String],
    now: DateTime<Utc>,
    sink: &mut dyn SetpointSink,
) -> Result<HashMap<String, CycleOutcome>, ControlError> {
    tick_release_countdowns(topology, cp_ids);

    let mut outcomes = HashMap::with_capacity(cp_ids.len());
    for cp_id in cp_ids {
        let outcome = evaluate_point(topology, cp_id, now, sink)?;
        debug!(
            congestion_point = %cp_id,
            outcome = outcome.label(),
            changed = outcome.changed_ids().len(),
            "congestion point evaluated"
        );
        outcomes.insert(cp_id.clone(), outcome);
    }
    Ok(outcomes)
}
