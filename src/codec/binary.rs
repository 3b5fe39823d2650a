use snafu::location;

use crate::error::{Error, Result};

const ESCAPE: u8 = b'\\';
const CARRIAGE_RETURN: u8 = b'\r';

/// Escapes `raw` so it never contains a bare carriage return: `\` becomes `\\`
/// and CR becomes the two characters `\r`. All other bytes pass through.
pub fn encode_binary(raw: &[u8]) -> Vec<u8> {
    let mut escaped = Vec::with_capacity(raw.len());

    for &byte in raw {
        match byte {
            ESCAPE => escaped.extend_from_slice(b"\\\\"),
            CARRIAGE_RETURN => escaped.extend_from_slice(b"\\r"),
            other => escaped.push(other),
        }
    }

    escaped
}

/// Reverses [`encode_binary`].
///
/// The input is scanned once from left to right, so an escaped backslash followed
/// by a literal `r` is never mistaken for an escaped carriage return.
pub fn decode_binary(escaped: &[u8]) -> Result<Vec<u8>> {
    let mut raw = Vec::with_capacity(escaped.len());
    let mut bytes = escaped.iter().copied().enumerate();

    while let Some((pos, byte)) = bytes.next() {
        if byte != ESCAPE {
            raw.push(byte);
            continue;
        }

        match bytes.next() {
            Some((_, ESCAPE)) => raw.push(ESCAPE),
            Some((_, b'r')) => raw.push(CARRIAGE_RETURN),
            Some((_, other)) => {
                return Err(Error::Decoding {
                    message: format!("unknown escape sequence \\{} at byte {pos}", other.escape_ascii()),
                    location: location!(),
                })
            }
            None => {
                return Err(Error::Decoding {
                    message: format!("dangling escape character at byte {pos}"),
                    location: location!(),
                })
            }
        }
    }

    Ok(raw)
}
