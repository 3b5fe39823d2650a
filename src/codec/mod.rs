//! # Wire Codec Module
//!
//! Stateless encode/decode helpers shared by the prober and its transport.
//! A frame on the wire is a 4-byte big-endian length prefix followed by exactly
//! that many payload bytes; the payload is either UTF-8 JSON text or a binary
//! string escaped so that it never contains a bare carriage return.
mod ansi;
mod binary;
mod frame;
mod json;
mod length;

pub use ansi::strip_ansi_escapes;
pub use binary::{decode_binary, encode_binary};
pub use frame::{
    decode_frame, decode_frame_with_limit, encode_frame, read_frame, read_frame_with_limit,
    write_frame, Frame, DEFAULT_MAX_FRAME_SIZE,
};
pub use json::{decode_json, encode_json};
pub use length::{decode_length, encode_length, LENGTH_PREFIX_SIZE};
