pub mod udp;

pub use udp::UdpBroadcaster;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a participant's setpoint moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SetpointChangeReason {
    Restrict,
    Release,
}

/// Notification emitted whenever the engine changes a participant setpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetpointChange {
    pub participant_id: String,
    pub congestion_point_id: String,
    pub reason: SetpointChangeReason,
    pub old_setpoint: f64,
    pub new_setpoint: f64,
    /// Measured flex taken away; present for restrictions only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flex_reduced: Option<f64>,
    /// Timestamp of the control cycle that produced the change.
    pub cycle_ts: DateTime<Utc>,
    pub emitted_at: DateTime<Utc>,
}

/// Synchronous notification sink injected into the engine. Implementations
/// must never fail back into the control loop.
pub trait SetpointSink {
    fn publish(&mut self, event: &SetpointChange);
}

/// Sink that discards every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl SetpointSink for NullSink {
    fn publish(&mut self, _event: &SetpointChange) {}
}

/// Handle returned by [`SetpointBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&SetpointChange) + Send>;

/// In-process subscriber list; events are delivered synchronously in
/// subscription order.
#[derive(Default)]
pub struct SetpointBus {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl SetpointBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&SetpointChange) + Send + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(listener)));
        id
    }

    /// Remove a subscriber; returns whether it was still registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl SetpointSink for SetpointBus {
    fn publish(&mut self, event: &SetpointChange) {
        for (_, listener) in &mut self.subscribers {
            listener(event);
        }
    }
}

impl std::fmt::Debug for SetpointBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetpointBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
