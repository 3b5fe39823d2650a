use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use snafu::location;
use tokio::sync::Mutex;

use crate::core::{clock::Clock, coordinate::ServiceCoordinate, transport::EchoTransport};
use crate::error::{Error, Result};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum EchoBehavior {
    /// Reply with the payload that was sent.
    #[default]
    Echo,
    /// Never complete the call.
    Silent,
    /// Complete the call with a transport error.
    Fail,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct MockTransport {
    transmitted: Arc<Mutex<Vec<(ServiceCoordinate, String)>>>,
    behaviors: Arc<StdMutex<HashMap<ServiceCoordinate, EchoBehavior>>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_behavior(&self, peer: &ServiceCoordinate, behavior: EchoBehavior) {
        let mut behaviors = self.behaviors.lock().unwrap();
        behaviors.insert(peer.clone(), behavior);
    }

    pub(crate) async fn transmitted(&self) -> Vec<(ServiceCoordinate, String)> {
        let tx = self.transmitted.lock().await;
        (*tx).clone()
    }

    async fn add_transmitted(&self, peer: &ServiceCoordinate, payload: &str) {
        let mut tx = self.transmitted.lock().await;
        tx.push((peer.clone(), payload.to_string()));
    }

    fn behavior(&self, peer: &ServiceCoordinate) -> EchoBehavior {
        let behaviors = self.behaviors.lock().unwrap();
        behaviors.get(peer).copied().unwrap_or_default()
    }
}

#[async_trait]
impl EchoTransport for MockTransport {
    async fn echo(&self, peer: &ServiceCoordinate, payload: String) -> Result<String> {
        self.add_transmitted(peer, &payload).await;

        match self.behavior(peer) {
            EchoBehavior::Echo => Ok(payload),
            EchoBehavior::Silent => std::future::pending().await,
            EchoBehavior::Fail => Err(Error::Transport {
                message: format!("{peer} is unreachable"),
                location: location!(),
            }),
        }
    }
}

/// Manually driven clock.
#[derive(Clone, Debug)]
pub(crate) struct MockClock {
    now: Arc<StdMutex<f64>>,
}

impl MockClock {
    pub(crate) fn new(start: f64) -> Self {
        Self {
            now: Arc::new(StdMutex::new(start)),
        }
    }

    pub(crate) fn set(&self, now: f64) {
        *self.now.lock().unwrap() = now;
    }

    pub(crate) fn advance(&self, secs: f64) {
        *self.now.lock().unwrap() += secs;
    }
}

impl Clock for MockClock {
    fn now(&self) -> f64 {
        *self.now.lock().unwrap()
    }
}
