//! Call-recording transform engine.
//!
//! Clones share one call log, so a test can keep a handle after the engine
//! has been moved into the simulation loop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sandbox_core::Frame;

use crate::application::calibrate::TransformEngine;

/// One recorded engine call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineCall {
    SetHeightConfig { shift: f64, scale: f64 },
    ResetDrag,
    ApplyDrag { dx: f64, dy: f64 },
    Render,
}

#[derive(Debug, Clone)]
pub struct RecordingEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    fill: u8,
}

impl RecordingEngine {
    /// Creates an engine that renders every pixel as `fill`.
    pub fn new(fill: u8) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fill,
        }
    }

    /// All calls so far, oldest first.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.log().clone()
    }

    /// Calls so far, excluding `Render`.
    pub fn calibration_calls(&self) -> Vec<EngineCall> {
        self.log()
            .iter()
            .copied()
            .filter(|call| *call != EngineCall::Render)
            .collect()
    }

    pub fn render_count(&self) -> usize {
        self.log()
            .iter()
            .filter(|call| **call == EngineCall::Render)
            .count()
    }

    fn log(&self) -> MutexGuard<'_, Vec<EngineCall>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RecordingEngine {
    fn default() -> Self {
        Self::new(0)
    }
}

impl TransformEngine for RecordingEngine {
    fn set_height_config(&mut self, shift: f64, scale: f64) {
        self.log().push(EngineCall::SetHeightConfig { shift, scale });
    }

    fn reset_drag(&mut self) {
        self.log().push(EngineCall::ResetDrag);
    }

    fn apply_drag(&mut self, dx: f64, dy: f64) {
        self.log().push(EngineCall::ApplyDrag { dx, dy });
    }

    fn render(&mut self, target: &mut Frame) {
        self.log().push(EngineCall::Render);
        target.fill(self.fill);
    }
}
