//! Control-plane message types.
//!
//! Requests arrive as one JSON object per line on the control port.  Frames
//! leave as binary messages on the frame port (see [`super::codec`]).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::calibration::CalibrationUpdate;
use crate::domain::command::Command;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Current protocol version byte.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Total size of the common message header in bytes.
pub const HEADER_SIZE: usize = 24;

/// Size of the `[width:4][height:4]` prefix at the start of a frame payload.
pub const FRAME_DIMENSIONS_SIZE: usize = 8;

/// Message type byte of a frame message.
pub const FRAME_MESSAGE_TYPE: u8 = 0x10;

/// Top-level key that marks a request line as a calibration update.
pub const CALIBRATE_KEY: &str = "calibrate";

// ── Requests ──────────────────────────────────────────────────────────────────

/// A device registration request as it appears on the wire.
///
/// ```json
/// {"state":"init","kind":"kinect","payload":{"serial":"A1"}}
/// ```
///
/// `"type"` is accepted as an alias for `"kind"`.  A missing payload decodes
/// as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRequest {
    pub state: String,
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

/// Any request the control port understands.
///
/// ```json
/// {"state":"init","kind":"beamer","payload":{}}
/// {"calibrate":{"op":"set_drag","x":10.0,"y":0.0}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ControlRequest {
    Calibrate { calibrate: CalibrationUpdate },
    Client(ClientRequest),
}

impl From<ControlRequest> for Command {
    fn from(request: ControlRequest) -> Self {
        match request {
            ControlRequest::Calibrate { calibrate } => Command::UpdateCalibration(calibrate),
            ControlRequest::Client(req) => Command::RegisterClient {
                state: req.state,
                kind: req.kind,
                payload: req.payload,
            },
        }
    }
}

// ── Replies ───────────────────────────────────────────────────────────────────

/// The per-line answer written back on the control port.
///
/// `Queued` only means the request reached the simulation loop's queue; the
/// registration itself may still be rejected there.
///
/// ```json
/// {"status":"queued"}
/// {"status":"rejected","error":"malformed request: ..."}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ControlReply {
    Queued,
    Rejected { error: String },
}
