//! # liveness-prober
//!
//! A liveness prober that periodically sends an echo probe to every known peer,
//! matches the asynchronous replies back to the outstanding probes and reports
//! timeouts, late replies and impossible timestamps, together with the
//! length-prefixed wire codec its transport speaks.
pub mod api;
pub mod codec;

mod core;
pub use crate::core::{
    clock::{Clock, SystemClock},
    coordinate::ServiceCoordinate,
    event::ProbeEvent,
    payload::EchoPayload,
    peers::PeerDirectory,
    transport::EchoTransport,
};

mod error;
pub use error::{Error, Result};

#[cfg(any(test, feature = "test-util"))]
#[path = "./test-utils/mod.rs"]
#[doc(hidden)]
mod test_utils;
