//! DispatchCommandUseCase: applies exactly one inbound command.
//!
//! # Registration rules
//!
//! ```text
//! state == "init" ?           no  → UnsupportedCommandState
//!   kind ∈ {kinect, beamer} ? no  → InvalidClientKind
//!     payload object/null ?   no  → InvalidPayload
//!       registry.register(kind, payload) → id
//! ```
//!
//! The state is checked before the kind, so `{"state":"update","kind":"x"}`
//! reports the state.  A rejected command causes no registry mutation and no
//! engine call.
//!
//! A calibration update is rejected when its own values or the calibration it
//! would produce are not finite, so repeated large drags cannot overflow the
//! composed offset.

use sandbox_core::domain::command::INIT_STATE;
use sandbox_core::{CalibrationUpdate, ClientId, ClientKind, Command};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::application::calibrate::{Calibrator, TransformEngine};
use crate::application::manage_clients::ClientRegistry;

/// Reasons a command is dropped without effect.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("unsupported command state {0:?}; only \"init\" is accepted")]
    UnsupportedCommandState(String),

    #[error("invalid client kind {0:?}; expected \"kinect\" or \"beamer\"")]
    InvalidClientKind(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("unsupported command: {0}")]
    UnsupportedCommand(&'static str),
}

/// The single effect a successful dispatch had.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Registered { kind: ClientKind, id: ClientId },
    Calibrated(CalibrationUpdate),
}

/// Validates `command` and applies it to the registry or the calibration.
///
/// # Errors
///
/// Returns a [`DispatchError`] describing why the command was dropped.
pub fn dispatch<E: TransformEngine + ?Sized>(
    command: Command,
    registry: &mut ClientRegistry,
    calibrator: &mut Calibrator,
    engine: &mut E,
) -> Result<DispatchOutcome, DispatchError> {
    match command {
        Command::RegisterClient {
            state,
            kind,
            payload,
        } => {
            let (kind, id) = register_client(&state, &kind, payload, registry)?;
            Ok(DispatchOutcome::Registered { kind, id })
        }
        Command::UpdateCalibration(update) => {
            if !update.is_finite() {
                return Err(DispatchError::InvalidPayload(format!(
                    "calibration values must be finite: {update:?}"
                )));
            }
            if !calibrator.state().applied(&update).is_finite() {
                return Err(DispatchError::InvalidPayload(format!(
                    "calibration would leave non-finite values: {update:?}"
                )));
            }
            calibrator.apply(update, engine);
            Ok(DispatchOutcome::Calibrated(update))
        }
        other => Err(DispatchError::UnsupportedCommand(other.label())),
    }
}

/// Validates and performs one client registration.
///
/// # Errors
///
/// See the module-level rules.
pub fn register_client(
    state: &str,
    kind: &str,
    payload: Value,
    registry: &mut ClientRegistry,
) -> Result<(ClientKind, ClientId), DispatchError> {
    if state != INIT_STATE {
        return Err(DispatchError::UnsupportedCommandState(state.to_string()));
    }
    let kind: ClientKind = kind
        .parse()
        .map_err(|_| DispatchError::InvalidClientKind(kind.to_string()))?;
    let payload = into_payload_object(payload)?;
    Ok((kind, registry.register(kind, payload)))
}

fn into_payload_object(payload: Value) -> Result<Map<String, Value>, DispatchError> {
    match payload {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(DispatchError::InvalidPayload(format!(
            "expected a JSON object, got {}",
            json_type_name(&other)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
