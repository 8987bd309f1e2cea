use ordered_float::OrderedFloat;
use std::cmp::Ordering;

use crate::domain::Participant;

/// Comparator ranking participants when flex capacity is reassigned.
pub type ParticipantOrder = fn(&Participant, &Participant) -> Ordering;

/// The one ordering policy: longest untouched first (a participant that was
/// never intervened sorts before any that was), then largest flex contract
/// first. Restriction and default release both use this order, so the
/// biggest flex contributors are clamped first and restored first.
pub fn intervention_priority(a: &Participant, b: &Participant) -> Ordering {
    // Option orders None before Some, which is exactly the "never intervened
    // sorts as -infinity" rule.
    a.last_intervention_at
        .cmp(&b.last_intervention_at)
        .then_with(|| OrderedFloat(b.flex_contract).cmp(&OrderedFloat(a.flex_contract)))
}
