//! Codec for control-plane requests and projected frames.
//!
//! Requests are single-line JSON objects (see [`super::messages`]).
//!
//! Frame wire format:
//! ```text
//! [version:1][msg_type:1][reserved:2][payload_len:4][seq:8][timestamp_us:8]
//! [width:4][height:4][pixels:width*height]
//! ```
//! Header size: 24 bytes. All multi-byte integers are big-endian.

use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;
use thiserror::Error;
use tracing::trace;

use crate::domain::calibration::CalibrationUpdate;
use crate::domain::command::Command;
use crate::domain::frame::{Frame, FrameError};
use crate::protocol::messages::{
    ClientRequest, ControlReply, ControlRequest, CALIBRATE_KEY, FRAME_DIMENSIONS_SIZE,
    FRAME_MESSAGE_TYPE, HEADER_SIZE, PROTOCOL_VERSION,
};

/// Errors that can occur during request decoding or frame encoding/decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The request line is not a recognised JSON request.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The protocol version in the header is not supported.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The message type byte in the header is not a frame.
    #[error("unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// The encoded payload length field does not match the actual data available.
    #[error("payload length mismatch: header says {declared}, available is {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },

    /// The frame does not fit in a single message.
    #[error("frame payload of {0} bytes exceeds the u32 length field")]
    FrameTooLarge(usize),

    /// The decoded dimensions and pixel data do not form a valid frame.
    #[error("invalid frame: {0}")]
    InvalidFrame(#[from] FrameError),
}

/// A parsed frame message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub payload_len: usize,
    pub sequence_number: u64,
    pub timestamp_us: u64,
}

/// A frame together with the metadata it was sent with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub frame: Frame,
    pub sequence_number: u64,
    pub timestamp_us: u64,
}

// ── Requests ──────────────────────────────────────────────────────────────────

/// Decodes one request line into a [`Command`].
///
/// Surrounding whitespace (including the trailing newline) is ignored.  A
/// line carrying a `calibrate` key is a calibration request and must carry
/// nothing else; any other object is read as a client registration.
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedRequest`] for empty lines, invalid JSON,
/// non-object JSON, a `calibrate` key mixed with other fields, or fields that
/// do not fit the request shape.  The message names the shape that failed.
///
/// # Examples
///
/// ```rust
/// use sandbox_core::{decode_request, Command};
///
/// let cmd = decode_request(r#"{"state":"init","kind":"kinect","payload":{}}"#).unwrap();
/// assert!(matches!(cmd, Command::RegisterClient { .. }));
/// ```
pub fn decode_request(line: &str) -> Result<Command, ProtocolError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(malformed("empty request"));
    }
    let value: Value = serde_json::from_str(line).map_err(|e| malformed(e.to_string()))?;
    let Value::Object(mut fields) = value else {
        return Err(malformed("request must be a JSON object"));
    };

    let request = match fields.remove(CALIBRATE_KEY) {
        Some(update) => {
            if !fields.is_empty() {
                let extra: Vec<&str> = fields.keys().map(String::as_str).collect();
                return Err(malformed(format!(
                    "calibrate request must not carry other fields, found {extra:?}"
                )));
            }
            let calibrate: CalibrationUpdate = serde_json::from_value(update)
                .map_err(|e| malformed(format!("invalid calibrate request: {e}")))?;
            ControlRequest::Calibrate { calibrate }
        }
        None => {
            let client: ClientRequest = serde_json::from_value(Value::Object(fields))
                .map_err(|e| malformed(format!("invalid client request: {e}")))?;
            ControlRequest::Client(client)
        }
    };
    trace!(?request, "decoded control request");
    Ok(request.into())
}

fn malformed(reason: impl Into<String>) -> ProtocolError {
    ProtocolError::MalformedRequest(reason.into())
}

/// Encodes a request as a single JSON line (without the trailing newline).
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedRequest`] if serialization fails.
pub fn encode_request(request: &ControlRequest) -> Result<String, ProtocolError> {
    serde_json::to_string(request).map_err(|e| malformed(e.to_string()))
}

/// Encodes a reply as a single JSON line (without the trailing newline).
///
/// # Errors
///
/// Returns [`ProtocolError::MalformedRequest`] if serialization fails.
pub fn encode_reply(reply: &ControlReply) -> Result<String, ProtocolError> {
    serde_json::to_string(reply).map_err(|e| malformed(e.to_string()))
}

// ── Frames ────────────────────────────────────────────────────────────────────

/// Encodes a [`Frame`] into a byte vector including the 24-byte header.
///
/// The sequence number is **not** set by this function – pass a pre-incremented
/// value from a [`crate::protocol::SequenceCounter`].
///
/// # Errors
///
/// Returns [`ProtocolError::FrameTooLarge`] if the payload length does not fit
/// in the 32-bit length field.
pub fn encode_frame(
    frame: &Frame,
    sequence_number: u64,
    timestamp_us: u64,
) -> Result<Vec<u8>, ProtocolError> {
    let payload_len = FRAME_DIMENSIONS_SIZE + frame.pixels().len();
    let payload_len_u32 =
        u32::try_from(payload_len).map_err(|_| ProtocolError::FrameTooLarge(payload_len))?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload_len);

    buf.push(PROTOCOL_VERSION);
    buf.push(FRAME_MESSAGE_TYPE);
    buf.push(0x00); // reserved
    buf.push(0x00); // reserved
    buf.extend_from_slice(&payload_len_u32.to_be_bytes());
    buf.extend_from_slice(&sequence_number.to_be_bytes());
    buf.extend_from_slice(&timestamp_us.to_be_bytes());

    buf.extend_from_slice(&frame.width().to_be_bytes());
    buf.extend_from_slice(&frame.height().to_be_bytes());
    buf.extend_from_slice(frame.pixels());
    Ok(buf)
}

/// Encodes a [`Frame`] using the current system time as the timestamp.
///
/// # Errors
///
/// Returns [`ProtocolError`] if encoding fails.
pub fn encode_frame_now(frame: &Frame, sequence_number: u64) -> Result<Vec<u8>, ProtocolError> {
    let timestamp_us = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64;
    encode_frame(frame, sequence_number, timestamp_us)
}

/// Parses the 24-byte header at the start of `bytes`.
///
/// Stream readers call this first to learn how many payload bytes follow.
///
/// # Errors
///
/// Returns [`ProtocolError`] for short input, a wrong version, or a message
/// type other than a frame.
pub fn decode_frame_header(bytes: &[u8]) -> Result<FrameHeader, ProtocolError> {
    if bytes.len() < HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let version = bytes[0];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }
    let msg_type = bytes[1];
    if msg_type != FRAME_MESSAGE_TYPE {
        return Err(ProtocolError::UnknownMessageType(msg_type));
    }

    Ok(FrameHeader {
        payload_len: read_u32(&bytes[4..8]) as usize,
        sequence_number: read_u64(&bytes[8..16]),
        timestamp_us: read_u64(&bytes[16..24]),
    })
}

/// Decodes one frame message from the beginning of `bytes`.
///
/// Returns the decoded frame and the total number of bytes consumed
/// (header + payload), so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are malformed.
///
/// # Examples
///
/// ```rust
/// use sandbox_core::{decode_frame, encode_frame, Frame};
///
/// let frame = Frame::new(4, 2).unwrap();
/// let bytes = encode_frame(&frame, 7, 0).unwrap();
/// let (decoded, n) = decode_frame(&bytes).unwrap();
/// assert_eq!(decoded.frame, frame);
/// assert_eq!(decoded.sequence_number, 7);
/// assert_eq!(n, bytes.len());
/// ```
pub fn decode_frame(bytes: &[u8]) -> Result<(DecodedFrame, usize), ProtocolError> {
    let header = decode_frame_header(bytes)?;
    let available = bytes.len() - HEADER_SIZE;
    if available < header.payload_len {
        return Err(ProtocolError::PayloadLengthMismatch {
            declared: header.payload_len,
            available,
        });
    }
    let payload = &bytes[HEADER_SIZE..HEADER_SIZE + header.payload_len];
    let frame = decode_frame_payload(payload)?;

    Ok((
        DecodedFrame {
            frame,
            sequence_number: header.sequence_number,
            timestamp_us: header.timestamp_us,
        },
        HEADER_SIZE + header.payload_len,
    ))
}

/// Decodes the `[width][height][pixels]` payload that follows a header.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] if the dimensions are missing
/// and [`ProtocolError::InvalidFrame`] if the pixel count does not match them.
pub fn decode_frame_payload(payload: &[u8]) -> Result<Frame, ProtocolError> {
    if payload.len() < FRAME_DIMENSIONS_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: FRAME_DIMENSIONS_SIZE,
            available: payload.len(),
        });
    }
    let width = read_u32(&payload[0..4]);
    let height = read_u32(&payload[4..8]);
    let pixels = payload[FRAME_DIMENSIONS_SIZE..].to_vec();
    Ok(Frame::from_pixels(width, height, pixels)?)
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[..4]);
    u32::from_be_bytes(raw)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&bytes[..8]);
    u64::from_be_bytes(raw)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
