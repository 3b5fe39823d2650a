use std::sync::Arc;

use snafu::location;
use tokio::sync::broadcast::{self, Receiver};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::core::clock::{Clock, SystemClock};
use crate::core::coordinate::ServiceCoordinate;
use crate::core::event::ProbeEvent;
use crate::core::peers::PeerDirectory;
use crate::core::prober::{EchoOutcome, LivenessProber};
use crate::core::transport::EchoTransport;
use crate::error::{Error, Result};

use super::config::ProberConfig;
use super::init_tracing;

/// Periodically probes every known peer through an [`EchoTransport`] and reports
/// what it observes as [`ProbeEvent`]s.
///
/// Peers listed in the configuration start out disconnected; the layer that owns
/// the connections flips them through [`Checker::peers`].
#[derive(Debug)]
pub struct Checker<T: EchoTransport, C: Clock = SystemClock> {
    identity: ServiceCoordinate,
    config: Arc<ProberConfig>,
    peers: Arc<PeerDirectory>,
    events: broadcast::Sender<ProbeEvent>,
    prober: LivenessProber<T, C>,
    completions: UnboundedReceiver<EchoOutcome>,
}

impl<T: EchoTransport> Checker<T> {
    /// Creates a checker reading timestamps from the system clock.
    pub fn try_new(identity: ServiceCoordinate, transport: T, config: ProberConfig) -> Result<Self> {
        Self::try_with_clock(identity, transport, SystemClock, config)
    }
}

impl<T: EchoTransport, C: Clock> Checker<T, C> {
    pub fn try_with_clock(
        identity: ServiceCoordinate,
        transport: T,
        clock: C,
        config: ProberConfig,
    ) -> Result<Self> {
        if config.probe_interval().is_zero() {
            return Err(Error::InvalidConfig {
                message: "probe interval must be greater than zero".to_string(),
                location: location!(),
            });
        }

        if config.event_buffer_size() == 0 {
            return Err(Error::InvalidConfig {
                message: "event buffer size must be greater than zero".to_string(),
                location: location!(),
            });
        }

        for peer in config.known_peers() {
            peer.validate()?;
        }

        let peers = Arc::new(
            config
                .known_peers()
                .iter()
                .map(|peer| (peer.clone(), false))
                .collect::<PeerDirectory>(),
        );
        let (events, _) = broadcast::channel(config.event_buffer_size());
        let config = Arc::new(config);

        let (prober, completions) = LivenessProber::new(
            identity.clone(),
            Arc::new(transport),
            Arc::new(clock),
            config.clone(),
            peers.clone(),
            events.clone(),
        );

        Ok(Self {
            identity,
            config,
            peers,
            events,
            prober,
            completions,
        })
    }

    pub fn identity(&self) -> &ServiceCoordinate {
        &self.identity
    }

    pub fn config(&self) -> &ProberConfig {
        &self.config
    }

    /// Returns the shared peer directory, for adding peers and updating their connectivity.
    pub fn peers(&self) -> Arc<PeerDirectory> {
        self.peers.clone()
    }

    /// Subscribes to the events reported by the prober.
    ///
    /// Only events reported after subscribing are received, so subscribe before [`Checker::run`].
    pub fn subscribe(&self) -> Receiver<ProbeEvent> {
        self.events.subscribe()
    }

    /// Starts probing in a background task. Abort the returned handle to stop it.
    pub fn run(self) -> JoinHandle<()> {
        init_tracing();

        tracing::info!(
            "[{}] starting prober for {} peers...",
            &self.identity,
            self.peers.len()
        );
        tokio::spawn(self.prober.run(self.completions))
    }
}
