use serde::{Deserialize, Serialize};

use super::coordinate::ServiceCoordinate;

/// Observational report produced while probing peers.
///
/// None of these are errors: they are logged and broadcast to subscribers, and
/// the prober keeps running afterwards. Durations are in seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ProbeEvent {
    /// The previous probe to `peer` was still unanswered when the next tick came.
    PeerTimeout { peer: ServiceCoordinate },
    /// `peer` was not connected, so no probe was sent this tick.
    PeerDisconnected { peer: ServiceCoordinate },
    /// A reply matched the outstanding probe to `peer`.
    ProbeSucceeded { peer: ServiceCoordinate, elapsed: f64 },
    /// A reply came back after the late threshold or matched no outstanding probe.
    LateReply { peer: ServiceCoordinate, elapsed: f64 },
    /// The timestamp echoed back is later than the recorded send time.
    ClockAnomaly { peer: ServiceCoordinate, skew: f64 },
    /// A reply that could not be parsed as an echo payload.
    MalformedReply { payload: String, reason: String },
}

impl ProbeEvent {
    pub(crate) fn new_peer_timeout(peer: &ServiceCoordinate) -> Self {
        ProbeEvent::PeerTimeout { peer: peer.clone() }
    }

    pub(crate) fn new_peer_disconnected(peer: &ServiceCoordinate) -> Self {
        ProbeEvent::PeerDisconnected { peer: peer.clone() }
    }

    pub(crate) fn new_probe_succeeded(peer: &ServiceCoordinate, elapsed: f64) -> Self {
        ProbeEvent::ProbeSucceeded {
            peer: peer.clone(),
            elapsed,
        }
    }

    pub(crate) fn new_late_reply(peer: &ServiceCoordinate, elapsed: f64) -> Self {
        ProbeEvent::LateReply {
            peer: peer.clone(),
            elapsed,
        }
    }

    pub(crate) fn new_clock_anomaly(peer: &ServiceCoordinate, skew: f64) -> Self {
        ProbeEvent::ClockAnomaly {
            peer: peer.clone(),
            skew,
        }
    }

    pub(crate) fn new_malformed_reply(payload: impl Into<String>, reason: impl Into<String>) -> Self {
        ProbeEvent::MalformedReply {
            payload: payload.into(),
            reason: reason.into(),
        }
    }

    /// The peer this event concerns, if it could be identified.
    pub fn peer(&self) -> Option<&ServiceCoordinate> {
        match self {
            ProbeEvent::PeerTimeout { peer }
            | ProbeEvent::PeerDisconnected { peer }
            | ProbeEvent::ProbeSucceeded { peer, .. }
            | ProbeEvent::LateReply { peer, .. }
            | ProbeEvent::ClockAnomaly { peer, .. } => Some(peer),
            ProbeEvent::MalformedReply { .. } => None,
        }
    }
}
