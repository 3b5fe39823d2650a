use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use snafu::location;

use crate::error::{Error, Result};

/// Identity of a service in the fleet: its name and shard number.
///
/// Rendered and parsed as `name,shard`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceCoordinate {
    name: String,
    shard: u32,
}

/// A name must be non-empty and free of `,` and whitespace, or the echo text
/// built from it would not parse back.
fn check_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("service name is empty".to_string());
    }

    match name.chars().find(|c| *c == ',' || c.is_whitespace()) {
        Some(c) => Err(format!("service name {name:?} contains {c:?}")),
        None => Ok(()),
    }
}

impl ServiceCoordinate {
    /// Builds a coordinate without checking the name; see [`ServiceCoordinate::try_new`].
    pub fn new(name: impl Into<String>, shard: u32) -> Self {
        Self {
            name: name.into(),
            shard,
        }
    }

    /// Builds a coordinate, rejecting names that are empty or contain `,` or whitespace.
    pub fn try_new(name: impl Into<String>, shard: u32) -> Result<Self> {
        let coordinate = Self::new(name, shard);
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Checks that the coordinate survives a round trip through the echo text.
    pub fn validate(&self) -> Result<()> {
        check_name(&self.name).map_err(|message| Error::InvalidConfig {
            message,
            location: location!(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shard(&self) -> u32 {
        self.shard
    }
}

impl fmt::Display for ServiceCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.name, self.shard)
    }
}

impl FromStr for ServiceCoordinate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(',');

        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), Some(shard), None) => {
                check_name(name).map_err(|message| Error::Decoding {
                    message,
                    location: location!(),
                })?;
                let shard = shard.parse::<u32>().map_err(|e| Error::Decoding {
                    message: format!("invalid shard in coordinate {s:?}: {e}"),
                    location: location!(),
                })?;

                Ok(Self::new(name, shard))
            }
            _ => Err(Error::Decoding {
                message: format!("coordinate {s:?} is not of the form name,shard"),
                location: location!(),
            }),
        }
    }
}
