use std::sync::Arc;

use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle};

use crate::error::Result;

use super::coordinate::ServiceCoordinate;
use super::transport::EchoTransport;

/// Runs one echo call in the background and posts its outcome to `completions`.
///
/// The outcome is dropped if the prober has already stopped.
pub(crate) fn spawn_echo<T: EchoTransport>(
    transport: &Arc<T>,
    peer: ServiceCoordinate,
    payload: String,
    completions: UnboundedSender<Result<String>>,
) -> JoinHandle<()> {
    let transport = Arc::clone(transport);

    tokio::spawn(async move {
        let outcome = transport.echo(&peer, payload).await;
        let _ = completions.send(outcome);
    })
}
