use std::net::UdpSocket;

use tracing::{debug, warn};

use super::{SetpointChange, SetpointSink};
use crate::config::EventsConfig;

/// Best-effort UDP fan-out around another sink.
///
/// Delegates every event to the wrapped sink first, then fires a JSON
/// datagram at the configured address. Delivery is fire-and-forget: bind,
/// resolve and send failures are swallowed and never reach the control loop.
pub struct UdpBroadcaster<S> {
    inner: S,
    socket: Option<UdpSocket>,
    target: String,
}

impl<S: SetpointSink> UdpBroadcaster<S> {
    pub fn new(inner: S, cfg: &EventsConfig) -> Self {
        let socket = if cfg.udp_disabled {
            None
        } else {
            match UdpSocket::bind("0.0.0.0:0") {
                Ok(socket) => Some(socket),
                Err(error) => {
                    warn!(%error, "could not bind UDP event socket; events stay in-process");
                    None
                }
            }
        };

        Self {
            inner,
            socket,
            target: format!("{}:{}", cfg.host, cfg.port),
        }
    }

    /// Whether datagrams will actually be sent.
    pub fn is_broadcasting(&self) -> bool {
        self.socket.is_some()
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: SetpointSink> SetpointSink for UdpBroadcaster<S> {
    fn publish(&mut self, event: &SetpointChange) {
        self.inner.publish(event);

        let Some(socket) = &self.socket else {
            return;
        };
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(error) => {
                debug!(%error, "could not serialize setpoint event");
                return;
            }
        };
        if let Err(error) = socket.send_to(&payload, &self.target) {
            debug!(%error, target = %self.target, "setpoint event datagram dropped");
        }
    }
}
