use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A flexible consumer under one or more congestion points.
///
/// A participant is guaranteed its `base` level at all times; on top of that
/// it has contracted `flex_contract` capacity that congestion points may take
/// away (restriction) and hand back (release). The `setpoint` is the level the
/// participant is currently authorized to consume up to.
#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    pub id: String,
    /// Guaranteed non-flexible level.
    pub base: f64,
    /// Maximum contracted flexible addition above base.
    pub flex_contract: f64,
    /// Cycles a restriction must persist before the restricting point may
    /// release it again. Always >= 1.
    pub release_after_cycles: u32,

    /// Externally supplied measurement, overwritten per cycle.
    pub measurement: f64,
    /// Derived: `base` while restricted, otherwise `base + flex_contract`.
    pub setpoint: f64,

    pub last_intervention_at: Option<DateTime<Utc>>,
    /// Ids of congestion points currently clamping this participant.
    pub active_restrictions: BTreeSet<String>,
    /// Per congestion point: cycles remaining before release is permitted.
    pub release_countdown_by_cp: BTreeMap<String, u32>,
}

impl Participant {
    pub fn new(
        id: impl Into<String>,
        base: f64,
        flex_contract: f64,
        release_after_cycles: u32,
    ) -> Self {
        Self {
            id: id.into(),
            base,
            flex_contract,
            release_after_cycles: release_after_cycles.max(1),
            measurement: 0.0,
            setpoint: base + flex_contract,
            last_intervention_at: None,
            active_restrictions: BTreeSet::new(),
            release_countdown_by_cp: BTreeMap::new(),
        }
    }

    /// Flexibility currently in use above base, never negative.
    pub fn flex_use(&self) -> f64 {
        (self.measurement - self.base).max(0.0)
    }

    /// Recompute the setpoint from the active restriction set. Must be called
    /// after every mutation of `active_restrictions`.
    pub fn recompute_setpoint(&mut self) {
        self.setpoint = if self.active_restrictions.is_empty() {
            self.base + self.flex_contract
        } else {
            self.base
        };
    }

    pub fn is_restricted_by(&self, cp_id: &str) -> bool {
        self.active_restrictions.contains(cp_id)
    }

    /// Arm the release countdown after this participant was just restricted
    /// by the given congestion point.
    pub fn on_restricted_by(&mut self, cp_id: &str) {
        self.release_countdown_by_cp
            .insert(cp_id.to_string(), self.release_after_cycles);
    }

    /// Decrement the countdown of every active restriction by one cycle,
    /// floored at zero.
    pub fn tick_release_countdowns(&mut self) {
        for cp_id in &self.active_restrictions {
            if let Some(remaining) = self.release_countdown_by_cp.get_mut(cp_id) {
                *remaining = remaining.saturating_sub(1);
            }
        }
    }

    /// Whether the given congestion point is allowed to release this
    /// participant yet.
    pub fn can_release_from(&self, cp_id: &str) -> bool {
        self.release_countdown_by_cp
            .get(cp_id)
            .map_or(true, |remaining| *remaining == 0)
    }

    /// Clear release bookkeeping after a restriction was lifted.
    pub fn on_released_by(&mut self, cp_id: &str) {
        self.release_countdown_by_cp.remove(cp_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flex_use_is_never_negative() {
        let mut p = Participant::new("P_1", 10.0, 5.0, 1);
        p.measurement = 6.0;
        assert_eq!(p.flex_use(), 0.0);
        p.measurement = 14.0;
        assert_eq!(p.flex_use(), 4.0);
    }

    #[test]
    fn setpoint_follows_active_restrictions() {
        let mut p = Participant::new("P_1", 10.0, 5.0, 1);
        assert_eq!(p.setpoint, 15.0);

        p.active_restrictions.insert("CP_A".to_string());
        p.recompute_setpoint();
        assert_eq!(p.setpoint, 10.0);

        p.active_restrictions.insert("CP_B".to_string());
        p.recompute_setpoint();
        assert_eq!(p.setpoint, 10.0);

        p.active_restrictions.remove("CP_A");
        p.recompute_setpoint();
        assert_eq!(p.setpoint, 10.0);

        p.active_restrictions.remove("CP_B");
        p.recompute_setpoint();
        assert_eq!(p.setpoint, 15.0);
    }

    #[test]
    fn release_delay_is_floored_to_one_cycle() {
        let p = Participant::new("P_1", 10.0, 5.0, 0);
        assert_eq!(p.release_after_cycles, 1);
    }

    #[test]
    fn countdown_ticks_only_for_active_restrictions() {
        let mut p = Participant::new("P_1", 10.0, 5.0, 3);
        p.active_restrictions.insert("CP_A".to_string());
        p.on_restricted_by("CP_A");
        // Stale entry without an active restriction must not tick.
        p.release_countdown_by_cp.insert("CP_B".to_string(), 2);

        p.tick_release_countdowns();
        assert_eq!(p.release_countdown_by_cp["CP_A"], 2);
        assert_eq!(p.release_countdown_by_cp["CP_B"], 2);
        assert!(!p.can_release_from("CP_A"));

        p.tick_release_countdowns();
        p.tick_release_countdowns();
        assert!(p.can_release_from("CP_A"));

        // Ticking past zero stays at zero.
        p.tick_release_countdowns();
        assert_eq!(p.release_countdown_by_cp["CP_A"], 0);
    }

    #[test]
    fn can_release_without_countdown_entry() {
        let p = Participant::new("P_1", 10.0, 5.0, 2);
        assert!(p.can_release_from("CP_UNKNOWN"));
    }
}
