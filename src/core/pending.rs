use std::collections::BTreeMap;

use super::coordinate::ServiceCoordinate;

/// An outstanding probe, stamped with the prober's clock at send time.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct PendingProbe {
    pub(crate) sent_at: f64,
}

/// Outstanding probes, at most one per peer.
///
/// Owned by the prober task alone, so it needs no synchronization.
#[derive(Clone, Debug, Default)]
pub(crate) struct PendingTable {
    probes: BTreeMap<ServiceCoordinate, PendingProbe>,
}

impl PendingTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.probes.len()
    }

    pub(crate) fn get(&self, peer: &ServiceCoordinate) -> Option<&PendingProbe> {
        self.probes.get(peer)
    }

    /// Records a probe sent at `sent_at`, replacing any earlier one.
    pub(crate) fn insert(&mut self, peer: ServiceCoordinate, sent_at: f64) -> Option<PendingProbe> {
        self.probes.insert(peer, PendingProbe { sent_at })
    }

    pub(crate) fn remove(&mut self, peer: &ServiceCoordinate) -> Option<PendingProbe> {
        self.probes.remove(peer)
    }
}
