use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use snafu::location;

use crate::error::{Error, Result};

use super::{
    decode_binary, decode_json, decode_length, encode_binary, encode_json, encode_length,
    LENGTH_PREFIX_SIZE,
};

/// Largest payload accepted from the wire (16 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// A single length-prefixed unit on the wire.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    payload: Vec<u8>,
}

impl Frame {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Builds a frame whose payload is the JSON encoding of `value`.
    pub fn json<T>(value: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        Ok(Self::new(encode_json(value)?))
    }

    /// Builds a frame whose payload is the escaped form of `raw`.
    pub fn binary(raw: &[u8]) -> Self {
        Self::new(encode_binary(raw))
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    pub fn decode_json<T: DeserializeOwned>(&self) -> Result<T> {
        decode_json(&self.payload)
    }

    pub fn decode_binary(&self) -> Result<Vec<u8>> {
        decode_binary(&self.payload)
    }

    /// Serializes the frame as length prefix followed by the payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode_frame(&self.payload)
    }
}

pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let prefix = encode_length(payload.len())?;

    let mut buf = Vec::with_capacity(LENGTH_PREFIX_SIZE + payload.len());
    buf.extend_from_slice(&prefix);
    buf.extend_from_slice(payload);

    Ok(buf)
}

/// Decodes the first frame held in `buf`, accepting payloads up to
/// [`DEFAULT_MAX_FRAME_SIZE`].
///
/// Returns `None` while `buf` does not yet contain a whole frame, otherwise the
/// frame together with the number of bytes it occupied.
pub fn decode_frame(buf: &[u8]) -> Result<Option<(Frame, usize)>> {
    decode_frame_with_limit(buf, DEFAULT_MAX_FRAME_SIZE)
}

pub fn decode_frame_with_limit(buf: &[u8], max_size: usize) -> Result<Option<(Frame, usize)>> {
    if buf.len() < LENGTH_PREFIX_SIZE {
        return Ok(None);
    }

    let len = payload_len(buf, max_size)?;
    let end = frame_end(len)?;
    if buf.len() < end {
        return Ok(None);
    }

    let frame = Frame::new(&buf[LENGTH_PREFIX_SIZE..end]);
    Ok(Some((frame, end)))
}

/// Reads one frame, accepting payloads up to [`DEFAULT_MAX_FRAME_SIZE`].
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    read_frame_with_limit(reader, DEFAULT_MAX_FRAME_SIZE).await
}

/// Reads one frame. The declared length is checked against `max_size` before
/// any payload buffer is allocated.
pub async fn read_frame_with_limit<R>(reader: &mut R, max_size: usize) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    reader.read_exact(&mut prefix).await?;

    let len = payload_len(&prefix, max_size)?;
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;

    Ok(Frame::new(payload))
}

pub async fn write_frame<W>(writer: &mut W, frame: &Frame) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let buf = frame.to_bytes()?;
    writer.write_all(&buf).await?;
    writer.flush().await?;

    Ok(())
}

fn payload_len(prefix: &[u8], max_size: usize) -> Result<usize> {
    let len = decode_length(prefix)?;

    match usize::try_from(len) {
        Ok(len) if len <= max_size => Ok(len),
        _ => Err(Error::Decoding {
            message: format!("frame of {len} bytes exceeds the limit of {max_size} bytes"),
            location: location!(),
        }),
    }
}

fn frame_end(len: usize) -> Result<usize> {
    LENGTH_PREFIX_SIZE.checked_add(len).ok_or_else(|| Error::Decoding {
        message: format!("frame of {len} bytes overflows the address space"),
        location: location!(),
    })
}
