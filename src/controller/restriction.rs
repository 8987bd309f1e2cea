use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ordering::intervention_priority;
use super::{sorted_participant_ids, ControlError};
use crate::events::{SetpointChange, SetpointChangeReason, SetpointSink};
use crate::topology::Topology;

/// A participant whose setpoint was actually lowered during a restriction
/// pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestrictedParticipant {
    pub id: String,
    pub new_setpoint: f64,
    /// Measured flex taken away, not the contracted amount.
    pub flex_reduced: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestrictOutcome {
    /// Overload left unresolved after the pass, floored at zero.
    pub remaining: f64,
    pub changed: Vec<RestrictedParticipant>,
}

/// Clamp participants under a congestion point to their base level until the
/// measured overload is covered.
///
/// Participants are visited in intervention-priority order. A participant is
/// left alone only when the overload is already covered, it is actually using
/// flex, and no other point has it pinned to base. Everything else is
/// restricted: zero-flex-use participants are clamped pre-emptively so they
/// cannot start drawing flex later in the cycle, and participants already at
/// base through another point are marked responsible here too so future
/// release gating stays correct.
pub fn restrict_on_point(
    topology: &mut Topology,
    cp_id: &str,
    now: DateTime<Utc>,
    sink: &mut dyn SetpointSink,
) -> Result<RestrictOutcome, ControlError> {
    let cp = topology
        .congestion_point(cp_id)
        .ok_or_else(|| ControlError::UnknownCongestionPoint(cp_id.to_string()))?;

    let mut remaining = cp.measurement - cp.upper_limit;
    if remaining <= 0.0 {
        return Ok(RestrictOutcome {
            remaining: 0.0,
            changed: Vec::new(),
        });
    }

    let ordered = sorted_participant_ids(topology, cp_id, intervention_priority);
    let mut changed = Vec::new();

    for participant_id in ordered {
        let Some(p) = topology.participant_mut(&participant_id) else {
            continue;
        };
        if p.is_restricted_by(cp_id) {
            continue;
        }

        let flex_use = p.flex_use();
        let pinned_elsewhere = !p.active_restrictions.is_empty() && p.setpoint == p.base;
        if remaining <= 0.0 && flex_use > 0.0 && !pinned_elsewhere {
            continue;
        }

        p.active_restrictions.insert(cp_id.to_string());
        p.on_restricted_by(cp_id);
        let old_setpoint = p.setpoint;
        p.recompute_setpoint();
        p.last_intervention_at = Some(now);
        let new_setpoint = p.setpoint;

        if new_setpoint != old_setpoint {
            changed.push(RestrictedParticipant {
                id: participant_id.clone(),
                new_setpoint,
                flex_reduced: flex_use,
            });
            sink.publish(&SetpointChange {
                participant_id,
                congestion_point_id: cp_id.to_string(),
                reason: SetpointChangeReason::Restrict,
                old_setpoint,
                new_setpoint,
                flex_reduced: Some(flex_use),
                cycle_ts: now,
                emitted_at: Utc::now(),
            });
        }

        remaining = (remaining - flex_use).max(0.0);
    }

    Ok(RestrictOutcome { remaining, changed })
}
