//! Codec for encoding and decoding events streamed by the host.
//!
//! Two framings are supported:
//! - newline-delimited JSON, one event per line
//! - MessagePack with a 4-byte big-endian length prefix

use bytes::{Buf, BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::Event;

/// Maximum frame size (16 MiB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Length prefix size in bytes.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Wire framing of the host event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Newline-delimited JSON.
    #[default]
    Json,
    /// Length-prefixed MessagePack.
    #[serde(rename = "msgpack")]
    MessagePack,
}

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Frame exceeds maximum size.
    #[error("Frame size {0} exceeds maximum {MAX_FRAME_SIZE}")]
    FrameTooLarge(usize),

    /// Not enough data to decode frame.
    #[error("Incomplete frame: need {0} more bytes")]
    Incomplete(usize),

    /// MessagePack encoding error.
    #[error("Encoding error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// MessagePack decoding error.
    #[error("Decoding error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// JSON encoding or decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Encode an event to bytes.
///
/// JSON events are terminated by a newline. MessagePack events are written as:
/// - 4 bytes: Big-endian length prefix
/// - N bytes: MessagePack-encoded event
///
/// # Errors
///
/// Returns an error if the event is too large or encoding fails.
pub fn encode(event: &Event, format: Format) -> Result<Bytes, ProtocolError> {
    let mut buf = BytesMut::new();
    encode_into(event, format, &mut buf)?;
    Ok(buf.freeze())
}

/// Encode an event into an existing buffer.
///
/// # Errors
///
/// Returns an error if the event is too large or encoding fails.
pub fn encode_into(event: &Event, format: Format, buf: &mut BytesMut) -> Result<(), ProtocolError> {
    match format {
        Format::Json => {
            let payload = serde_json::to_vec(event)?;
            if payload.len() > MAX_FRAME_SIZE {
                return Err(ProtocolError::FrameTooLarge(payload.len()));
            }
            buf.reserve(payload.len() + 1);
            buf.extend_from_slice(&payload);
            buf.put_u8(b'\n');
        }
        Format::MessagePack => {
            let payload = rmp_serde::to_vec_named(event)?;
            if payload.len() > MAX_FRAME_SIZE {
                return Err(ProtocolError::FrameTooLarge(payload.len()));
            }
            buf.reserve(LENGTH_PREFIX_SIZE + payload.len());
            buf.put_u32(payload.len() as u32);
            buf.extend_from_slice(&payload);
        }
    }
    Ok(())
}

/// Decode a single event from bytes.
///
/// # Errors
///
/// Returns an error if the data is incomplete, too large, or invalid.
pub fn decode(data: &[u8], format: Format) -> Result<Event, ProtocolError> {
    match format {
        Format::Json => {
            if data.len() > MAX_FRAME_SIZE {
                return Err(ProtocolError::FrameTooLarge(data.len()));
            }
            Ok(serde_json::from_slice(trim_whitespace(data))?)
        }
        Format::MessagePack => {
            if data.len() < LENGTH_PREFIX_SIZE {
                return Err(ProtocolError::Incomplete(LENGTH_PREFIX_SIZE - data.len()));
            }

            let length = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;

            if length > MAX_FRAME_SIZE {
                return Err(ProtocolError::FrameTooLarge(length));
            }

            let total_size = LENGTH_PREFIX_SIZE + length;
            if data.len() < total_size {
                return Err(ProtocolError::Incomplete(total_size - data.len()));
            }

            Ok(rmp_serde::from_slice(&data[LENGTH_PREFIX_SIZE..total_size])?)
        }
    }
}

/// Try to decode an event from a buffer, advancing it if successful.
///
/// Returns `Ok(Some(event))` if a complete event was decoded,
/// `Ok(None)` if more data is needed, or `Err` on protocol error.
/// A malformed JSON line is consumed before the error is returned, so the
/// caller can keep reading from the next line.
///
/// # Errors
///
/// Returns an error if the frame is too large or invalid.
pub fn decode_from(buf: &mut BytesMut, format: Format) -> Result<Option<Event>, ProtocolError> {
    match format {
        Format::Json => loop {
            let Some(newline) = buf.iter().position(|b| *b == b'\n') else {
                if buf.len() > MAX_FRAME_SIZE {
                    let size = buf.len();
                    buf.clear();
                    return Err(ProtocolError::FrameTooLarge(size));
                }
                return Ok(None);
            };

            let frame = buf.split_to(newline + 1);
            let line = trim_whitespace(&frame[..newline]);
            if line.is_empty() {
                continue;
            }
            if line.len() > MAX_FRAME_SIZE {
                return Err(ProtocolError::FrameTooLarge(line.len()));
            }
            return Ok(Some(serde_json::from_slice(line)?));
        },
        Format::MessagePack => {
            if buf.len() < LENGTH_PREFIX_SIZE {
                return Ok(None);
            }

            let length = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;

            if length > MAX_FRAME_SIZE {
                return Err(ProtocolError::FrameTooLarge(length));
            }

            let total_size = LENGTH_PREFIX_SIZE + length;
            if buf.len() < total_size {
                return Ok(None);
            }

            buf.advance(LENGTH_PREFIX_SIZE);
            let payload = buf.split_to(length);
            Ok(Some(rmp_serde::from_slice(&payload)?))
        }
    }
}

fn trim_whitespace(mut data: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = data {
        if !first.is_ascii_whitespace() {
            break;
        }
        data = rest;
    }
    while let [rest @ .., last] = data {
        if !last.is_ascii_whitespace() {
            break;
        }
        data = rest;
    }
    data
}
