use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ordering::intervention_priority;
use super::release::{has_pending_restrictions, release_budget, release_on_point, ReleasedParticipant};
use super::restriction::{restrict_on_point, RestrictedParticipant};
use super::ControlError;
use crate::domain::CongestionState;
use crate::events::SetpointSink;
use crate::topology::Topology;

/// Per-cycle outcome of evaluating one congestion point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CycleOutcome {
    EnterCongestion {
        remaining: f64,
        changed: Vec<RestrictedParticipant>,
    },
    AdjustCongestion {
        remaining: f64,
        changed: Vec<RestrictedParticipant>,
    },
    ExitCongestion {
        changed: Vec<ReleasedParticipant>,
    },
    ReleaseProgress {
        changed: Vec<ReleasedParticipant>,
    },
    /// Restrictions remain but every candidate is still gated by its release
    /// countdown.
    ReleaseWait,
    NoChange {
        remaining: f64,
    },
}

impl CycleOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            CycleOutcome::EnterCongestion { .. } => "ENTER_CONGESTION",
            CycleOutcome::AdjustCongestion { .. } => "ADJUST_CONGESTION",
            CycleOutcome::ExitCongestion { .. } => "EXIT_CONGESTION",
            CycleOutcome::ReleaseProgress { .. } => "RELEASE_PROGRESS",
            CycleOutcome::ReleaseWait => "RELEASE_WAIT",
            CycleOutcome::NoChange { .. } => "NO_CHANGE",
        }
    }

    /// Ids of participants whose setpoint moved this cycle.
    pub fn changed_ids(&self) -> Vec<&str> {
        match self {
            CycleOutcome::EnterCongestion { changed, .. }
            | CycleOutcome::AdjustCongestion { changed, .. } => {
                changed.iter().map(|c| c.id.as_str()).collect()
            }
            CycleOutcome::ExitCongestion { changed }
            | CycleOutcome::ReleaseProgress { changed } => {
                changed.iter().map(|c| c.id.as_str()).collect()
            }
            CycleOutcome::ReleaseWait | CycleOutcome::NoChange { .. } => Vec::new(),
        }
    }
}

/// Evaluate the hysteresis state machine for one congestion point.
///
/// Transition precedence, once per cycle:
/// 1. FREE above the upper limit enters congestion and restricts.
/// 2. FREE otherwise tries a budget-bounded release.
/// 3. CONGESTED below the release limit exits and releases.
/// 4. CONGESTED above the upper limit restricts again.
/// 5. Anything else, notably the dead band between the two limits, changes
///    nothing.
pub fn evaluate_point(
    topology: &mut Topology,
    cp_id: &str,
    now: DateTime<Utc>,
    sink: &mut dyn SetpointSink,
) -> Result<CycleOutcome, ControlError> {
    let (state, measurement, upper_limit, release_limit) = {
        let cp = topology
            .congestion_point(cp_id)
            .ok_or_else(|| ControlError::UnknownCongestionPoint(cp_id.to_string()))?;
        (cp.state, cp.measurement, cp.upper_limit, cp.release_limit)
    };

    if state == CongestionState::Free && measurement > upper_limit {
        if let Some(cp) = topology.congestion_point_mut(cp_id) {
            cp.state = CongestionState::Congested;
        }
        let outcome = restrict_on_point(topology, cp_id, now, sink)?;
        return Ok(CycleOutcome::EnterCongestion {
            remaining: outcome.remaining,
            changed: outcome.changed,
        });
    }

    if state == CongestionState::Free {
        let budget = release_budget(topology, cp_id)?;
        let outcome =
            release_on_point(topology, cp_id, now, intervention_priority, budget, sink)?;
        if !outcome.changed.is_empty() {
            return Ok(CycleOutcome::ReleaseProgress {
                changed: outcome.changed,
            });
        }
        if has_pending_restrictions(topology, cp_id) {
            return Ok(CycleOutcome::ReleaseWait);
        }
        return Ok(CycleOutcome::NoChange { remaining: 0.0 });
    }

    if measurement < release_limit {
        if let Some(cp) = topology.congestion_point_mut(cp_id) {
            cp.state = CongestionState::Free;
        }
        let budget = release_budget(topology, cp_id)?;
        let outcome =
            release_on_point(topology, cp_id, now, intervention_priority, budget, sink)?;
        return Ok(CycleOutcome::ExitCongestion {
            changed: outcome.changed,
        });
    }

    if measurement > upper_limit {
        let outcome = restrict_on_point(topology, cp_id, now, sink)?;
        if !outcome.changed.is_empty() {
            return Ok(CycleOutcome::AdjustCongestion {
                remaining: outcome.remaining,
                changed: outcome.changed,
            });
        }
        return Ok(CycleOutcome::NoChange {
            remaining: outcome.remaining,
        });
    }

    // Dead band: no release, no restriction.
    Ok(CycleOutcome::NoChange { remaining: 0.0 })
}
