pub mod congestion_point;
pub mod node;
pub mod participant;

pub use congestion_point::{CongestionPoint, CongestionState};
pub use node::Node;
pub use participant::Participant;
