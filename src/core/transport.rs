//! # Echo Transport Module
//!
//! This module defines the `EchoTransport` trait, which abstracts the RPC layer the prober
//! sends its probes through. Connection management and request dispatch live behind it;
//! the prober only needs a way to send an echo payload to a peer and eventually get the
//! same text back.
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

use super::coordinate::ServiceCoordinate;

/// The `EchoTransport` trait abstracts the request/reply channel to peers.
#[async_trait]
pub trait EchoTransport: Send + Sync + 'static {
    /// Sends `payload` to `peer` and resolves with the peer's reply.
    ///
    /// A call may never resolve; the prober treats that as a timeout on its
    /// next tick. Transport-level failures are returned as errors.
    async fn echo(&self, peer: &ServiceCoordinate, payload: String) -> Result<String>;
}

#[async_trait]
impl<T> EchoTransport for Arc<T>
where
    T: EchoTransport + ?Sized,
{
    async fn echo(&self, peer: &ServiceCoordinate, payload: String) -> Result<String> {
        (**self).echo(peer, payload).await
    }
}
