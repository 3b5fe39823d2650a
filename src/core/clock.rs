use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the timestamps recorded when probes are sent and replies arrive.
///
/// Timestamps are seconds as `f64`; only differences between two readings of the
/// same clock are ever interpreted.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> f64;
}

/// Wall clock reading seconds since the Unix epoch.
#[derive(Copy, Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default()
    }
}
