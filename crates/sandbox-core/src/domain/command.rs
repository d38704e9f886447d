//! Commands travelling from the control plane to the simulation loop.
//!
//! A `RegisterClient` command carries the raw `state` and `kind` strings exactly
//! as the device sent them.  Validation happens in the simulation loop's
//! dispatcher so that every rejection is logged in one place.

use serde_json::Value;

use crate::domain::calibration::CalibrationUpdate;

/// The only request state the dispatcher accepts for a client registration.
pub const INIT_STATE: &str = "init";

/// One inbound control request.
///
/// New variants may be added without breaking callers that match on the
/// existing ones.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Command {
    /// A device asks to be registered.
    RegisterClient {
        /// Request state; only `"init"` is accepted.
        state: String,
        /// Device kind name; `"kinect"` or `"beamer"`.
        kind: String,
        /// Device configuration; must be a JSON object or `null`.
        payload: Value,
    },
    /// An operator changes one calibration group.
    UpdateCalibration(CalibrationUpdate),
}

impl Command {
    /// Convenience constructor for an `"init"` registration.
    pub fn register(kind: impl Into<String>, payload: Value) -> Self {
        Command::RegisterClient {
            state: INIT_STATE.to_string(),
            kind: kind.into(),
            payload,
        }
    }

    /// Short label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Command::RegisterClient { .. } => "register_client",
            Command::UpdateCalibration(_) => "update_calibration",
        }
    }
}
