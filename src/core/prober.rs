use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{Instant, MissedTickBehavior};

use crate::api::config::ProberConfig;
use crate::codec::strip_ansi_escapes;
use crate::core::utils::spawn_echo;
use crate::error::Result;

use super::clock::Clock;
use super::coordinate::ServiceCoordinate;
use super::event::ProbeEvent;
use super::payload::EchoPayload;
use super::peers::PeerDirectory;
use super::pending::PendingTable;
use super::transport::EchoTransport;

/// Result of one echo call, as delivered back to the prober task.
pub(crate) type EchoOutcome = Result<String>;

/// Sends echo probes to every known peer and classifies the replies.
///
/// `on_tick` and `on_reply` take `&mut self` and are only ever driven from the
/// single task running [`LivenessProber::run`], so the pending table is never
/// accessed concurrently. Echo calls run in their own tasks and report back
/// through the completion channel.
#[derive(Debug)]
pub(crate) struct LivenessProber<T: EchoTransport, C: Clock> {
    identity: ServiceCoordinate,
    transport: Arc<T>,
    clock: Arc<C>,
    config: Arc<ProberConfig>,
    peers: Arc<PeerDirectory>,
    pending: PendingTable,
    events: broadcast::Sender<ProbeEvent>,
    completions: mpsc::UnboundedSender<EchoOutcome>,
}

impl<T: EchoTransport, C: Clock> LivenessProber<T, C> {
    pub(crate) fn new(
        identity: ServiceCoordinate,
        transport: Arc<T>,
        clock: Arc<C>,
        config: Arc<ProberConfig>,
        peers: Arc<PeerDirectory>,
        events: broadcast::Sender<ProbeEvent>,
    ) -> (Self, mpsc::UnboundedReceiver<EchoOutcome>) {
        let (completions, rx) = mpsc::unbounded_channel();

        let prober = Self {
            identity,
            transport,
            clock,
            config,
            peers,
            pending: PendingTable::new(),
            events,
            completions,
        };

        (prober, rx)
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> &PendingTable {
        &self.pending
    }

    /// Runs one probing round. Always returns `true`; a round never stops the prober.
    pub(crate) fn on_tick(&mut self) -> bool {
        let now = self.clock.now();
        tracing::debug!(
            "[{}] probing {} peers, {} probes outstanding",
            &self.identity,
            self.peers.len(),
            self.pending.len()
        );

        for (peer, connected) in self.peers.snapshot() {
            if self.pending.remove(&peer).is_some() {
                self.report(ProbeEvent::new_peer_timeout(&peer));
            }

            if !connected {
                self.report(ProbeEvent::new_peer_disconnected(&peer));
                continue;
            }

            let payload = EchoPayload::new(peer.clone(), now).to_string();
            self.pending.insert(peer.clone(), now);

            tracing::debug!("[{}] sending ECHO {:?} to {}", &self.identity, &payload, &peer);
            spawn_echo(&self.transport, peer, payload, self.completions.clone());
        }

        true
    }

    /// Classifies the outcome of one echo call.
    pub(crate) fn on_reply(&mut self, outcome: EchoOutcome) {
        let data = match outcome {
            Ok(data) => data,
            Err(e) => {
                // A peer that never answers is caught by the timeout on the next tick.
                tracing::debug!("[{}] dropping ECHO after transport error: {e}", &self.identity);
                return;
            }
        };

        let payload = match data.parse::<EchoPayload>() {
            Ok(payload) => payload,
            Err(e) => {
                self.report(ProbeEvent::new_malformed_reply(data, e.to_string()));
                return;
            }
        };

        let current = self.clock.now();
        let peer = payload.coordinate();
        let elapsed = current - payload.sent_at();
        let late_threshold = self.config.late_threshold().as_secs_f64();

        let recorded = match self.pending.get(peer) {
            Some(probe) if elapsed <= late_threshold => probe.sent_at,
            _ => {
                self.report(ProbeEvent::new_late_reply(peer, elapsed));
                return;
            }
        };

        let skew = payload.sent_at() - recorded;
        if skew > self.config.clock_skew_threshold().as_secs_f64() {
            self.report(ProbeEvent::new_clock_anomaly(peer, skew));
        }

        self.report(ProbeEvent::new_probe_succeeded(peer, elapsed));
        self.pending.remove(peer);
    }

    /// Drives ticks and replies until the task is aborted.
    pub(crate) async fn run(mut self, mut completions: mpsc::UnboundedReceiver<EchoOutcome>) {
        let period = self.config.probe_interval();
        let start = match self.config.tick_immediately() {
            true => Instant::now(),
            false => Instant::now() + period,
        };

        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.on_tick() {
                        tracing::info!("[{}] stopping prober", &self.identity);
                        break;
                    }
                }
                Some(outcome) = completions.recv() => self.on_reply(outcome),
            }
        }
    }

    fn report(&self, event: ProbeEvent) {
        let id = &self.identity;

        match &event {
            ProbeEvent::PeerTimeout { peer } => {
                tracing::info!("[{id}] service {peer} timeout, retrying")
            }
            ProbeEvent::PeerDisconnected { peer } => {
                tracing::info!("[{id}] service {peer} not connected")
            }
            ProbeEvent::ProbeSucceeded { peer, elapsed } => {
                tracing::info!("[{id}] got reply ({elapsed:.3} s) from {peer}")
            }
            ProbeEvent::LateReply { peer, elapsed } => {
                tracing::info!("[{id}] got late reply ({elapsed:.3} s) from {peer}")
            }
            ProbeEvent::ClockAnomaly { peer, skew } => tracing::error!(
                "[{id}] timestamp echoed by {peer} is {skew:.3} s ahead of the recorded send time"
            ),
            ProbeEvent::MalformedReply { payload, reason } => tracing::error!(
                "[{id}] malformed ECHO reply {:?}: {reason}",
                strip_ansi_escapes(payload)
            ),
        }

        // No subscribers is fine; the log line above is the report of record.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use snafu::location;
    use tokio::sync::{broadcast, mpsc};

    use crate::{
        api::config::ProberConfig,
        core::{
            coordinate::ServiceCoordinate, event::ProbeEvent, peers::PeerDirectory,
            pending::PendingProbe,
        },
        error::Error,
        test_utils::mocks::{EchoBehavior, MockClock, MockTransport},
    };

    use super::{EchoOutcome, LivenessProber};

    struct Harness {
        prober: LivenessProber<MockTransport, MockClock>,
        completions: mpsc::UnboundedReceiver<EchoOutcome>,
        events: broadcast::Receiver<ProbeEvent>,
        transport: Arc<MockTransport>,
        clock: MockClock,
        peers: Arc<PeerDirectory>,
    }

    fn create_prober(peers: &[(&str, u32, bool)]) -> Harness {
        let config = ProberConfig::builder()
            .with_probe_interval(Duration::from_secs(10))
            .build();

        create_prober_with_config(peers, config)
    }

    fn create_prober_with_config(peers: &[(&str, u32, bool)], config: ProberConfig) -> Harness {
        let transport = Arc::new(MockTransport::new());
        let clock = MockClock::new(100.0);
        let config = Arc::new(config);
        let peers = Arc::new(
            peers
                .iter()
                .map(|(name, shard, connected)| (ServiceCoordinate::new(*name, *shard), *connected))
                .collect::<PeerDirectory>(),
        );
        let (tx, events) = broadcast::channel(64);

        let (prober, completions) = LivenessProber::new(
            ServiceCoordinate::new("Checker", 0),
            transport.clone(),
            Arc::new(clock.clone()),
            config,
            peers.clone(),
            tx,
        );

        Harness {
            prober,
            completions,
            events,
            transport,
            clock,
            peers,
        }
    }

    fn drain(events: &mut broadcast::Receiver<ProbeEvent>) -> Vec<ProbeEvent> {
        let mut drained = vec![];
        while let Ok(event) = events.try_recv() {
            drained.push(event);
        }
        drained
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-6, "{actual} != {expected}");
    }

    #[tokio::test]
    async fn test_prober_all_peers_reply() {
        let mut h = create_prober(&[("ServiceA", 0, true), ("ServiceB", 0, true), ("ServiceB", 1, true)]);

        assert!(h.prober.on_tick());
        assert_eq!(h.prober.pending().len(), 3);

        h.clock.advance(0.25);
        for _ in 0..3 {
            let outcome = h.completions.recv().await.unwrap();
            h.prober.on_reply(outcome);
        }

        assert_eq!(h.prober.pending().len(), 0);

        let events = drain(&mut h.events);
        assert_eq!(events.len(), 3);
        for event in &events {
            match event {
                ProbeEvent::ProbeSucceeded { elapsed, .. } => assert_close(*elapsed, 0.25),
                other => panic!("unexpected event {other:?}"),
            }
        }

        let mut transmitted = h.transport.transmitted().await;
        transmitted.sort();
        let expected = vec![
            (ServiceCoordinate::new("ServiceA", 0), "ServiceA,0 100.000".to_string()),
            (ServiceCoordinate::new("ServiceB", 0), "ServiceB,0 100.000".to_string()),
            (ServiceCoordinate::new("ServiceB", 1), "ServiceB,1 100.000".to_string()),
        ];
        assert_eq!(transmitted, expected);
    }

    #[tokio::test]
    async fn test_prober_disconnected_peer() {
        let mut h = create_prober(&[("ServiceA", 0, false)]);

        assert!(h.prober.on_tick());
        tokio::task::yield_now().await;

        let expected = vec![ProbeEvent::PeerDisconnected {
            peer: ServiceCoordinate::new("ServiceA", 0),
        }];
        assert_eq!(drain(&mut h.events), expected);
        assert_eq!(h.prober.pending().len(), 0);
        assert!(h.completions.try_recv().is_err());
        assert!(h.transport.transmitted().await.is_empty());
    }

    #[tokio::test]
    async fn test_prober_timeout_then_fresh_probe() {
        let mut h = create_prober(&[("ServiceA", 0, true)]);
        let peer = ServiceCoordinate::new("ServiceA", 0);
        h.transport.set_behavior(&peer, EchoBehavior::Silent);

        h.prober.on_tick();
        assert!(drain(&mut h.events).is_empty());

        h.clock.set(110.0);
        h.prober.on_tick();

        let expected = vec![ProbeEvent::PeerTimeout { peer: peer.clone() }];
        assert_eq!(drain(&mut h.events), expected);
        assert_eq!(h.prober.pending().get(&peer), Some(&PendingProbe { sent_at: 110.0 }));
    }

    #[tokio::test]
    async fn test_prober_timeout_then_disconnected() {
        let mut h = create_prober(&[("ServiceA", 0, true)]);
        let peer = ServiceCoordinate::new("ServiceA", 0);
        h.transport.set_behavior(&peer, EchoBehavior::Silent);

        h.prober.on_tick();
        h.peers.set_connected(&peer, false).unwrap();
        h.prober.on_tick();

        let expected = vec![
            ProbeEvent::PeerTimeout { peer: peer.clone() },
            ProbeEvent::PeerDisconnected { peer: peer.clone() },
        ];
        assert_eq!(drain(&mut h.events), expected);
        assert_eq!(h.prober.pending().len(), 0);
    }

    #[tokio::test]
    async fn test_prober_late_reply_without_pending_probe() {
        let mut h = create_prober(&[("ServiceA", 0, true)]);

        h.prober.on_reply(Ok("ServiceA,0 85.000".to_string()));

        let events = drain(&mut h.events);
        assert_eq!(events.len(), 1);
        match &events[0] {
            ProbeEvent::LateReply { peer, elapsed } => {
                assert_eq!(peer, &ServiceCoordinate::new("ServiceA", 0));
                assert_close(*elapsed, 15.0);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_prober_late_reply_keeps_pending_probe() {
        let mut h = create_prober(&[("ServiceA", 0, true)]);
        let peer = ServiceCoordinate::new("ServiceA", 0);
        h.transport.set_behavior(&peer, EchoBehavior::Silent);

        h.prober.on_tick();
        h.clock.set(100.5);
        h.prober.on_reply(Ok("ServiceA,0 85.000".to_string()));

        let events = drain(&mut h.events);
        assert!(matches!(events.as_slice(), [ProbeEvent::LateReply { .. }]));
        assert_eq!(h.prober.pending().get(&peer), Some(&PendingProbe { sent_at: 100.0 }));

        h.clock.set(111.0);
        h.prober.on_reply(Ok("ServiceA,0 100.000".to_string()));

        let events = drain(&mut h.events);
        assert!(matches!(events.as_slice(), [ProbeEvent::LateReply { elapsed, .. }] if *elapsed > 10.0));
        assert_eq!(h.prober.pending().len(), 1);
    }

    #[tokio::test]
    async fn test_prober_clock_anomaly() {
        let mut h = create_prober(&[("ServiceA", 0, true)]);
        let peer = ServiceCoordinate::new("ServiceA", 0);
        h.transport.set_behavior(&peer, EchoBehavior::Silent);

        h.prober.on_tick();
        h.clock.set(100.6);
        h.prober.on_reply(Ok("ServiceA,0 100.500".to_string()));

        let events = drain(&mut h.events);
        match events.as_slice() {
            [ProbeEvent::ClockAnomaly { peer: p1, skew }, ProbeEvent::ProbeSucceeded { peer: p2, elapsed }] =>
            {
                assert_eq!(p1, &peer);
                assert_eq!(p2, &peer);
                assert_close(*skew, 0.5);
                assert_close(*elapsed, 0.1);
            }
            other => panic!("unexpected events {other:?}"),
        }
        assert_eq!(h.prober.pending().len(), 0);
    }

    #[tokio::test]
    async fn test_prober_reply_at_late_threshold_succeeds() {
        let mut h = create_prober(&[("ServiceA", 0, true)]);
        let peer = ServiceCoordinate::new("ServiceA", 0);
        h.transport.set_behavior(&peer, EchoBehavior::Silent);

        h.prober.on_tick();
        h.clock.set(110.0);
        h.prober.on_reply(Ok("ServiceA,0 100.000".to_string()));

        let expected = vec![ProbeEvent::ProbeSucceeded {
            peer: peer.clone(),
            elapsed: 10.0,
        }];
        assert_eq!(drain(&mut h.events), expected);
        assert_eq!(h.prober.pending().len(), 0);
    }

    #[tokio::test]
    async fn test_prober_skew_at_threshold_is_not_a_clock_anomaly() {
        let config = ProberConfig::builder()
            .with_probe_interval(Duration::from_secs(10))
            .with_clock_skew_threshold(Duration::from_millis(500))
            .build();
        let mut h = create_prober_with_config(&[("ServiceA", 0, true)], config);
        let peer = ServiceCoordinate::new("ServiceA", 0);
        h.transport.set_behavior(&peer, EchoBehavior::Silent);

        h.prober.on_tick();
        h.clock.set(100.6);
        h.prober.on_reply(Ok("ServiceA,0 100.500".to_string()));

        let events = drain(&mut h.events);
        match events.as_slice() {
            [ProbeEvent::ProbeSucceeded { peer: p, elapsed }] => {
                assert_eq!(p, &peer);
                assert_close(*elapsed, 0.1);
            }
            other => panic!("unexpected events {other:?}"),
        }
        assert_eq!(h.prober.pending().len(), 0);
    }

    #[tokio::test]
    async fn test_prober_skips_peer_with_space_in_name() {
        let mut h = create_prober(&[]);
        let peer = ServiceCoordinate::new("Service A", 0);

        let result = h.peers.set_connected(&peer, true);
        assert!(matches!(result, Err(Error::InvalidConfig { .. })));

        h.prober.on_tick();
        tokio::task::yield_now().await;

        assert!(drain(&mut h.events).is_empty());
        assert!(h.transport.transmitted().await.is_empty());
        assert_eq!(h.prober.pending().len(), 0);
    }

    #[tokio::test]
    async fn test_prober_rounding_is_not_a_clock_anomaly() {
        for sent_at in [99.9996, 100.0004] {
            let mut h = create_prober(&[("ServiceA", 0, true)]);
            h.clock.set(sent_at);

            h.prober.on_tick();
            h.clock.advance(0.01);
            let outcome = h.completions.recv().await.unwrap();
            assert_eq!(outcome.as_deref().unwrap(), "ServiceA,0 100.000");
            h.prober.on_reply(outcome);

            let events = drain(&mut h.events);
            assert!(matches!(events.as_slice(), [ProbeEvent::ProbeSucceeded { .. }]), "{sent_at}");
        }
    }

    #[tokio::test]
    async fn test_prober_malformed_reply_leaves_pending_probe() {
        let mut h = create_prober(&[("ServiceA", 0, true)]);
        let peer = ServiceCoordinate::new("ServiceA", 0);
        h.transport.set_behavior(&peer, EchoBehavior::Silent);

        h.prober.on_tick();
        for data in ["garbage", "ServiceA,0", "ServiceA 100.000", "ServiceA,0 \u{1b}[31mlater\u{1b}[0m"] {
            h.prober.on_reply(Ok(data.to_string()));

            let events = drain(&mut h.events);
            match events.as_slice() {
                [ProbeEvent::MalformedReply { payload, .. }] => assert_eq!(payload, data),
                other => panic!("unexpected events {other:?}"),
            }
        }

        assert_eq!(h.prober.pending().get(&peer), Some(&PendingProbe { sent_at: 100.0 }));
    }

    #[tokio::test]
    async fn test_prober_transport_error_is_silent() {
        let mut h = create_prober(&[("ServiceA", 0, true)]);
        let peer = ServiceCoordinate::new("ServiceA", 0);
        h.transport.set_behavior(&peer, EchoBehavior::Fail);

        h.prober.on_tick();
        let outcome = h.completions.recv().await.unwrap();
        assert!(outcome.is_err());
        h.prober.on_reply(outcome);

        h.prober.on_reply(Err(Error::Transport {
            message: "connection reset".to_string(),
            location: location!(),
        }));

        assert!(drain(&mut h.events).is_empty());
        assert_eq!(h.prober.pending().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prober_run_ticks_periodically() {
        let h = create_prober(&[("ServiceA", 0, true)]);
        let peer = ServiceCoordinate::new("ServiceA", 0);
        h.transport.set_behavior(&peer, EchoBehavior::Silent);
        let mut events = h.events;

        let handle = tokio::spawn(h.prober.run(h.completions));

        let event = events.recv().await.unwrap();
        assert_eq!(event, ProbeEvent::PeerTimeout { peer: peer.clone() });

        handle.abort();
    }
}
