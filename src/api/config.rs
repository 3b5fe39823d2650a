use std::time::Duration;

use crate::core::coordinate::ServiceCoordinate;

/// Default interval between two probing rounds.
pub(crate) const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(10);

/// Default round-trip time above which a reply is reported as late.
pub(crate) const DEFAULT_LATE_THRESHOLD: Duration = Duration::from_secs(10);

/// Default tolerance between the timestamp echoed back by a peer
/// and the send time recorded locally.
pub(crate) const DEFAULT_CLOCK_SKEW_THRESHOLD: Duration = Duration::from_millis(1);

/// Default capacity of the event broadcast channel.
pub(crate) const DEFAULT_EVENT_BUFFER_SIZE: usize = 32;

/// Builder for creating a [`ProberConfig`] with customized settings for a liveness prober.
/// Allows configuring the probing interval, the anomaly thresholds and the known peers.
#[derive(Clone, Debug)]
pub struct ProberConfigBuilder {
    /// Peers to monitor from the start.
    known_peers: Vec<ServiceCoordinate>,
    /// The duration between consecutive probing rounds.
    probe_interval: Duration,
    /// Whether the first probing round runs immediately on startup.
    tick_immediately: bool,
    /// Round-trip time above which a reply is late.
    late_threshold: Duration,
    /// How far an echoed timestamp may run ahead of the recorded send time.
    clock_skew_threshold: Duration,
    /// Capacity of the event broadcast channel.
    event_buffer_size: usize,
}

impl ProberConfigBuilder {
    /// Creates a new [`ProberConfigBuilder`] with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the builder and returns a fully constructed [`ProberConfig`].
    pub fn build(self) -> ProberConfig {
        ProberConfig {
            known_peers: self.known_peers,
            probe_interval: self.probe_interval,
            tick_immediately: self.tick_immediately,
            late_threshold: self.late_threshold,
            clock_skew_threshold: self.clock_skew_threshold,
            event_buffer_size: self.event_buffer_size,
        }
    }

    /// Sets the peers monitored from the start.
    pub fn with_known_peers<T>(mut self, known_peers: T) -> Self
    where
        T: IntoIterator<Item = ServiceCoordinate>,
    {
        self.known_peers = known_peers.into_iter().collect();
        self
    }

    /// Sets the interval between probing rounds.
    pub fn with_probe_interval(mut self, probe_interval: Duration) -> Self {
        self.probe_interval = probe_interval;
        self
    }

    /// Sets whether the first probing round runs as soon as the prober starts.
    pub fn with_tick_immediately(mut self, tick_immediately: bool) -> Self {
        self.tick_immediately = tick_immediately;
        self
    }

    /// Sets the round-trip time above which a reply is reported as late.
    pub fn with_late_threshold(mut self, late_threshold: Duration) -> Self {
        self.late_threshold = late_threshold;
        self
    }

    /// Sets the tolerated skew between echoed and recorded send times.
    pub fn with_clock_skew_threshold(mut self, clock_skew_threshold: Duration) -> Self {
        self.clock_skew_threshold = clock_skew_threshold;
        self
    }

    /// Sets the capacity of the event broadcast channel.
    pub fn with_event_buffer_size(mut self, event_buffer_size: usize) -> Self {
        self.event_buffer_size = event_buffer_size;
        self
    }
}

impl Default for ProberConfigBuilder {
    fn default() -> Self {
        Self {
            known_peers: vec![],
            probe_interval: DEFAULT_PROBE_INTERVAL,
            tick_immediately: true,
            late_threshold: DEFAULT_LATE_THRESHOLD,
            clock_skew_threshold: DEFAULT_CLOCK_SKEW_THRESHOLD,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

/// Configuration for a liveness prober,
/// used to store the probing interval, the anomaly thresholds and the known peers.
#[derive(Clone, Debug)]
pub struct ProberConfig {
    known_peers: Vec<ServiceCoordinate>,
    probe_interval: Duration,
    tick_immediately: bool,
    late_threshold: Duration,
    clock_skew_threshold: Duration,
    event_buffer_size: usize,
}

impl ProberConfig {
    /// Creates a new [`ProberConfig`] with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new [`ProberConfigBuilder`] to construct a [`ProberConfig`].
    pub fn builder() -> ProberConfigBuilder {
        ProberConfigBuilder::new()
    }

    /// Returns the peers monitored from the start.
    pub fn known_peers(&self) -> &[ServiceCoordinate] {
        &self.known_peers
    }

    /// Returns the interval between probing rounds.
    pub fn probe_interval(&self) -> Duration {
        self.probe_interval
    }

    /// Returns whether the first probing round runs immediately.
    pub fn tick_immediately(&self) -> bool {
        self.tick_immediately
    }

    /// Returns the round-trip time above which a reply is late.
    pub fn late_threshold(&self) -> Duration {
        self.late_threshold
    }

    /// Returns the tolerated skew between echoed and recorded send times.
    pub fn clock_skew_threshold(&self) -> Duration {
        self.clock_skew_threshold
    }

    /// Returns the capacity of the event broadcast channel.
    pub fn event_buffer_size(&self) -> usize {
        self.event_buffer_size
    }
}

impl Default for ProberConfig {
    fn default() -> Self {
        ProberConfigBuilder::new().build()
    }
}
