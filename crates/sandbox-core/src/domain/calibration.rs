//! Calibration state: how raw sensor heights map onto the projected image.
//!
//! The state is split into three groups that are always changed as a unit:
//!
//! ```text
//! height config   height_shift, height_scale   normalized = (raw + shift) * scale
//! drag            drag_offset_x, drag_offset_y pan of the map in image pixels
//! zoom            zoom                         stored only; not used for rendering
//! ```
//!
//! Drag offsets accumulate: each `DragBy` adds to the current offset and a
//! `ResetDrag` returns it to the origin.  `SetDrag` is a reset followed by a
//! single drag, so the engine never observes a stale composed offset.

use serde::{Deserialize, Serialize};

/// The calibration values owned by the simulation loop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationState {
    pub height_shift: f64,
    pub height_scale: f64,
    pub drag_offset_x: f64,
    pub drag_offset_y: f64,
    pub zoom: f64,
}

impl Default for CalibrationState {
    fn default() -> Self {
        Self {
            height_shift: 0.0,
            height_scale: 1.0,
            drag_offset_x: 0.0,
            drag_offset_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl CalibrationState {
    /// Folds one update into the tracked state.
    ///
    /// This mirrors what the transform engine does with the same update, so
    /// after every successful push the two agree.
    pub fn apply(&mut self, update: &CalibrationUpdate) {
        match *update {
            CalibrationUpdate::SetHeightConfig { shift, scale } => {
                self.height_shift = shift;
                self.height_scale = scale;
            }
            CalibrationUpdate::ResetDrag => {
                self.drag_offset_x = 0.0;
                self.drag_offset_y = 0.0;
            }
            CalibrationUpdate::DragBy { dx, dy } => {
                self.drag_offset_x += dx;
                self.drag_offset_y += dy;
            }
            CalibrationUpdate::SetDrag { x, y } => {
                self.drag_offset_x = x;
                self.drag_offset_y = y;
            }
        }
    }

    /// Returns the state `update` would produce, leaving `self` unchanged.
    pub fn applied(&self, update: &CalibrationUpdate) -> Self {
        let mut next = *self;
        next.apply(update);
        next
    }

    /// Returns `true` when every tracked value is finite.
    pub fn is_finite(&self) -> bool {
        [
            self.height_shift,
            self.height_scale,
            self.drag_offset_x,
            self.drag_offset_y,
            self.zoom,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// A change to one calibration group.
///
/// # Serde representation
///
/// ```json
/// {"op":"set_height_config","shift":-0.2,"scale":1.5}
/// {"op":"reset_drag"}
/// {"op":"drag_by","dx":4.0,"dy":-2.0}
/// {"op":"set_drag","x":0.0,"y":0.0}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CalibrationUpdate {
    /// Replaces the height shift and scale together.
    SetHeightConfig { shift: f64, scale: f64 },
    /// Returns the drag offset to the origin.
    ResetDrag,
    /// Adds to the current drag offset.
    DragBy { dx: f64, dy: f64 },
    /// Replaces the drag offset (reset, then drag).
    SetDrag { x: f64, y: f64 },
}

impl CalibrationUpdate {
    /// Returns `true` when every numeric field is finite.
    pub fn is_finite(&self) -> bool {
        match *self {
            CalibrationUpdate::SetHeightConfig { shift, scale } => {
                shift.is_finite() && scale.is_finite()
            }
            CalibrationUpdate::ResetDrag => true,
            CalibrationUpdate::DragBy { dx, dy } => dx.is_finite() && dy.is_finite(),
            CalibrationUpdate::SetDrag { x, y } => x.is_finite() && y.is_finite(),
        }
    }
}
