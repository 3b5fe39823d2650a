use dashmap::DashMap;

use crate::error::Result;

use super::coordinate::ServiceCoordinate;

/// The set of peers the prober monitors, each with a connectivity flag.
///
/// The directory is shared with whatever layer owns the connections, which
/// flips the flags as peers come and go. Peers are never removed.
#[derive(Debug, Default)]
pub struct PeerDirectory {
    peers: DashMap<ServiceCoordinate, bool>,
}

impl PeerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn contains(&self, peer: &ServiceCoordinate) -> bool {
        self.peers.contains_key(peer)
    }

    /// Adds `peer` if it is unknown. Returns `false` when it was already known,
    /// in which case its connectivity flag is left as it was.
    ///
    /// Fails with [`crate::Error::InvalidConfig`] if the peer's name would not survive the echo text.
    pub fn add_peer(&self, peer: ServiceCoordinate, connected: bool) -> Result<bool> {
        peer.validate()?;

        let mut added = false;
        self.peers.entry(peer).or_insert_with(|| {
            added = true;
            connected
        });
        Ok(added)
    }

    /// Updates the connectivity flag of `peer`, adding it if it is unknown.
    pub fn set_connected(&self, peer: &ServiceCoordinate, connected: bool) -> Result<()> {
        peer.validate()?;

        self.peers.insert(peer.clone(), connected);
        Ok(())
    }

    pub fn is_connected(&self, peer: &ServiceCoordinate) -> Option<bool> {
        self.peers.get(peer).map(|flag| *flag)
    }

    /// Returns every known peer with its current flag, ordered by coordinate.
    pub fn snapshot(&self) -> Vec<(ServiceCoordinate, bool)> {
        let mut peers: Vec<_> = self
            .peers
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();
        peers.sort();
        peers
    }
}

impl FromIterator<(ServiceCoordinate, bool)> for PeerDirectory {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (ServiceCoordinate, bool)>,
    {
        Self {
            peers: DashMap::from_iter(iter),
        }
    }
}
