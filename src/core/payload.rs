use std::{fmt, str::FromStr};

use snafu::location;

use crate::error::{Error, Result};

use super::coordinate::ServiceCoordinate;

/// Text carried by an echo probe: `"<name>,<shard> <sent_at>"`, with the send
/// timestamp rendered in seconds to three decimal places.
#[derive(Clone, Debug, PartialEq)]
pub struct EchoPayload {
    coordinate: ServiceCoordinate,
    sent_at: f64,
}

impl EchoPayload {
    pub fn new(coordinate: ServiceCoordinate, sent_at: f64) -> Self {
        Self {
            coordinate,
            sent_at,
        }
    }

    pub fn coordinate(&self) -> &ServiceCoordinate {
        &self.coordinate
    }

    pub fn sent_at(&self) -> f64 {
        self.sent_at
    }
}

impl fmt::Display for EchoPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.3}", self.coordinate, self.sent_at)
    }
}

impl FromStr for EchoPayload {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        let [coordinate, sent_at] = tokens.as_slice() else {
            return Err(Error::Decoding {
                message: format!("expected 2 tokens, got {}", tokens.len()),
                location: location!(),
            });
        };

        let sent_at = sent_at
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(|| Error::Decoding {
                message: format!("timestamp {sent_at:?} is not a finite number"),
                location: location!(),
            })?;

        Ok(Self::new(coordinate.parse()?, sent_at))
    }
}
