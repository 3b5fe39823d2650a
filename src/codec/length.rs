use std::fmt::Display;

use snafu::location;

use crate::error::{Error, Result};

/// Number of bytes used by the big-endian length prefix of a frame.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Encodes `n` as a 4-byte big-endian length prefix.
///
/// Any integer type is accepted; values outside `[0, 2^32)` are rejected with
/// [`Error::Encoding`].
pub fn encode_length<N>(n: N) -> Result<[u8; LENGTH_PREFIX_SIZE]>
where
    N: TryInto<u32> + Copy + Display,
{
    let value: u32 = n.try_into().map_err(|_| Error::Encoding {
        message: format!("length {n} does not fit in {LENGTH_PREFIX_SIZE} bytes"),
        location: location!(),
    })?;

    Ok([
        (value >> 24) as u8,
        ((value >> 16) & 0xFF) as u8,
        ((value >> 8) & 0xFF) as u8,
        (value & 0xFF) as u8,
    ])
}

/// Decodes a length prefix produced by [`encode_length`].
///
/// Only the first [`LENGTH_PREFIX_SIZE`] bytes are read.
pub fn decode_length(bytes: &[u8]) -> Result<u32> {
    match bytes {
        [b0, b1, b2, b3, ..] => Ok(u32::from(*b0) * (1 << 24)
            + u32::from(*b1) * (1 << 16)
            + u32::from(*b2) * (1 << 8)
            + u32::from(*b3)),
        _ => Err(Error::Decoding {
            message: format!(
                "length prefix needs {LENGTH_PREFIX_SIZE} bytes, got {}",
                bytes.len()
            ),
            location: location!(),
        }),
    }
}
