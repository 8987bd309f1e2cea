use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ordering::ParticipantOrder;
use super::{sorted_participant_ids, ControlError};
use crate::events::{SetpointChange, SetpointChangeReason, SetpointSink};
use crate::topology::Topology;

/// A participant whose setpoint was actually raised during a release pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleasedParticipant {
    pub id: String,
    pub new_setpoint: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseOutcome {
    pub changed: Vec<ReleasedParticipant>,
    /// Budget left over after the pass, floored at zero.
    pub remaining: f64,
}

/// Headroom below the switching threshold: how much flex may be restored this
/// cycle without pushing the point straight back into congestion.
pub fn release_budget(topology: &Topology, cp_id: &str) -> Result<f64, ControlError> {
    let cp = topology
        .congestion_point(cp_id)
        .ok_or_else(|| ControlError::UnknownCongestionPoint(cp_id.to_string()))?;
    Ok((cp.upper_limit - cp.measurement).max(0.0))
}

/// Whether any descendant participant is still restricted by this point.
pub fn has_pending_restrictions(topology: &Topology, cp_id: &str) -> bool {
    topology
        .participants_under(cp_id)
        .iter()
        .any(|p| p.is_restricted_by(cp_id))
}

/// Lift this point's restrictions, budget-constrained, in the given order.
///
/// A participant only actually comes back up when no other point still pins
/// it; in that case the release consumes `flex_contract` from the budget and
/// emits an event. Otherwise only this point's bookkeeping is cleared, for
/// free and silently. Participants whose release countdown has not reached
/// zero stay restricted.
pub fn release_on_point(
    topology: &mut Topology,
    cp_id: &str,
    now: DateTime<Utc>,
    order: ParticipantOrder,
    budget: f64,
    sink: &mut dyn SetpointSink,
) -> Result<ReleaseOutcome, ControlError> {
    if topology.congestion_point(cp_id).is_none() {
        return Err(ControlError::UnknownCongestionPoint(cp_id.to_string()));
    }

    let mut remaining = budget.max(0.0);
    let ordered = sorted_participant_ids(topology, cp_id, order);
    let mut changed = Vec::new();

    for participant_id in ordered {
        if remaining <= 0.0 {
            break;
        }
        let Some(p) = topology.participant_mut(&participant_id) else {
            continue;
        };
        if !p.is_restricted_by(cp_id) {
            continue;
        }
        if !p.can_release_from(cp_id) {
            continue;
        }

        let old_setpoint = p.setpoint;
        p.active_restrictions.remove(cp_id);
        p.on_released_by(cp_id);
        p.recompute_setpoint();

        if p.setpoint != old_setpoint {
            p.last_intervention_at = Some(now);
            let new_setpoint = p.setpoint;
            let flex_contract = p.flex_contract;
            changed.push(ReleasedParticipant {
                id: participant_id.clone(),
                new_setpoint,
            });
            remaining = (remaining - flex_contract).max(0.0);
            sink.publish(&SetpointChange {
                participant_id,
                congestion_point_id: cp_id.to_string(),
                reason: SetpointChangeReason::Release,
                old_setpoint,
                new_setpoint,
                flex_reduced: None,
                cycle_ts: now,
                emitted_at: Utc::now(),
            });
        }
    }

    Ok(ReleaseOutcome { changed, remaining })
}
