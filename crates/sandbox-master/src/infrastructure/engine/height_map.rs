//! Reference transform engine over a raw height field.
//!
//! # Mapping
//!
//! ```text
//! normalized = clamp((raw + shift) * scale, 0.0, 1.0)
//! pixel      = round(normalized * 255)
//! ```
//!
//! # Drag
//!
//! `apply_drag` adds to a running offset and `reset_drag` zeroes it.  At
//! render time the image is shifted by `-round(offset)` on each axis: the
//! output pixel at `(x, y)` shows the height at `(x + ox, y + oy)`.  Output
//! pixels whose source falls outside the height field are black.  Offsets
//! larger than the field plus the target are clamped before use, since every
//! pixel is black beyond that point anyway.

use sandbox_core::Frame;
use thiserror::Error;
use tracing::debug;

use crate::application::calibrate::TransformEngine;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("height field has {actual} samples, expected {expected}")]
    HeightCountMismatch { expected: usize, actual: usize },

    #[error("height sample {index} is not finite")]
    NonFiniteHeight { index: usize },
}

#[derive(Debug, Clone)]
pub struct HeightMapEngine {
    width: u32,
    height: u32,
    heights: Vec<f32>,
    shift: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl HeightMapEngine {
    /// Creates an engine over a flat (all zero) height field.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            heights: vec![0.0; width as usize * height as usize],
            shift: 0.0,
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }

    /// Replaces the height field with a row-major `width × height` sample set.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::HeightCountMismatch`] when the sample count is
    /// wrong and [`EngineError::NonFiniteHeight`] for NaN or infinite samples.
    /// The current field is left untouched on error.
    pub fn load_heights(&mut self, heights: Vec<f32>) -> Result<(), EngineError> {
        let expected = self.heights.len();
        if heights.len() != expected {
            return Err(EngineError::HeightCountMismatch {
                expected,
                actual: heights.len(),
            });
        }
        if let Some(index) = heights.iter().position(|h| !h.is_finite()) {
            return Err(EngineError::NonFiniteHeight { index });
        }
        self.heights = heights;
        Ok(())
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn height_config(&self) -> (f64, f64) {
        (self.shift, self.scale)
    }

    /// The accumulated drag offset.
    pub fn drag_offset(&self) -> (f64, f64) {
        (self.offset_x, self.offset_y)
    }

    fn brightness(&self, raw: f32) -> u8 {
        let normalized = ((f64::from(raw) + self.shift) * self.scale).clamp(0.0, 1.0);
        (normalized * 255.0).round() as u8
    }

    fn sample(&self, x: i64, y: i64) -> Option<f32> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        self.heights
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

impl TransformEngine for HeightMapEngine {
    fn set_height_config(&mut self, shift: f64, scale: f64) {
        debug!(shift, scale, "height config set");
        self.shift = shift;
        self.scale = scale;
    }

    fn reset_drag(&mut self) {
        self.offset_x = 0.0;
        self.offset_y = 0.0;
    }

    fn apply_drag(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    fn render(&mut self, target: &mut Frame) {
        let shift_x = pixel_shift(self.offset_x, self.width, target.width());
        let shift_y = pixel_shift(self.offset_y, self.height, target.height());
        let row_len = target.width() as usize;
        if row_len == 0 {
            return;
        }
        let rows: Vec<Vec<u8>> = (0..i64::from(target.height()))
            .map(|y| {
                (0..row_len as i64)
                    .map(|x| {
                        self.sample(x + shift_x, y + shift_y)
                            .map_or(0, |raw| self.brightness(raw))
                    })
                    .collect()
            })
            .collect();
        for (dst, src) in target.pixels_mut().chunks_exact_mut(row_len).zip(rows) {
            dst.copy_from_slice(&src);
        }
    }
}

/// Rounds a drag offset to whole pixels, bounded by `field + target`.
fn pixel_shift(offset: f64, field: u32, target: u32) -> i64 {
    let limit = f64::from(field) + f64::from(target);
    offset.round().clamp(-limit, limit) as i64
}
