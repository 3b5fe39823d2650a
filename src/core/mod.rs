//! # Core Module
//!
//! The `core` module contains the liveness prober and the types it works with:
//! service coordinates, the echo payload format, the peer directory, the table of
//! outstanding probes, the events it reports, and the clock and transport abstractions.
pub(crate) mod clock;
pub(crate) mod coordinate;
pub(crate) mod event;
pub(crate) mod payload;
pub(crate) mod peers;
mod pending;
pub(crate) mod prober;
pub(crate) mod transport;
mod utils;
