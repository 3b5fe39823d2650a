//! # Prober API Module
//!
//! This module provides the primary API for running the liveness prober.
//! It includes configuration options and the main entry point for creating and running a prober.
//!
//! ## Modules
//!
//! - [`config`]: Contains configuration structures and builders for customizing the prober.
//! - [`checker`]: Provides the `Checker` struct for wiring a transport into a prober and running it.
//!
//! ## Tracing Initialization
//!
//! The `init_tracing` function initializes the tracing subscriber for logging purposes.

use lazy_static::lazy_static;
use tracing_subscriber::EnvFilter;

pub mod checker;
pub mod config;

lazy_static! {
    static ref TRACING: () = {
        // An application that installed its own subscriber keeps it.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    };
}

/// Initializes the tracing subscriber for logging.
///
/// This function ensures that the tracing subscriber is only initialized once.
/// It is called when a [`checker::Checker`] starts running.
pub(crate) fn init_tracing() {
    lazy_static::initialize(&TRACING);
}
