//! CalibrateUseCase: pushes calibration groups into the transform engine.
//!
//! The transform engine is stateful: it remembers the last height config and
//! the composed drag offset.  The [`Calibrator`] keeps a copy of that state
//! and only ever changes it in whole groups, so the two never disagree.
//!
//! # Start-up order
//!
//! ```text
//! set_height_config(shift, scale)
//! reset_drag()
//! apply_drag(offset_x, offset_y)
//! ```
//!
//! The reset comes first even for a `(0.0, 0.0)` offset: the engine may have
//! been used before, and a drag applied on top of an old offset would compose
//! with it.

use sandbox_core::{CalibrationState, CalibrationUpdate, Frame};

/// The mapping engine that turns calibrated height data into a frame.
///
/// All calls are synchronous and infallible; errors inside the engine are the
/// engine's concern.
#[cfg_attr(test, mockall::automock)]
pub trait TransformEngine: Send {
    /// Sets the affine transform from raw sensor height to normalized elevation.
    fn set_height_config(&mut self, shift: f64, scale: f64);

    /// Returns the drag offset to the origin.
    fn reset_drag(&mut self);

    /// Adds `(dx, dy)` to the current drag offset.
    fn apply_drag(&mut self, dx: f64, dy: f64);

    /// Renders the current height data into `target`.
    fn render(&mut self, target: &mut Frame);
}

/// Owns the calibration state and keeps the engine in step with it.
#[derive(Debug, Clone)]
pub struct Calibrator {
    state: CalibrationState,
}

impl Calibrator {
    /// Pushes the start-up calibration into `engine` in the required order.
    pub fn initialize<E: TransformEngine + ?Sized>(
        initial: CalibrationState,
        engine: &mut E,
    ) -> Self {
        engine.set_height_config(initial.height_shift, initial.height_scale);
        engine.reset_drag();
        engine.apply_drag(initial.drag_offset_x, initial.drag_offset_y);
        Self { state: initial }
    }

    /// Applies one group update to `engine` and to the tracked state.
    ///
    /// Callers validate the update first (see
    /// [`CalibrationUpdate::is_finite`]); the engine is never handed a partial
    /// group.
    pub fn apply<E: TransformEngine + ?Sized>(
        &mut self,
        update: CalibrationUpdate,
        engine: &mut E,
    ) {
        match update {
            CalibrationUpdate::SetHeightConfig { shift, scale } => {
                engine.set_height_config(shift, scale)
            }
            CalibrationUpdate::ResetDrag => engine.reset_drag(),
            CalibrationUpdate::DragBy { dx, dy } => engine.apply_drag(dx, dy),
            CalibrationUpdate::SetDrag { x, y } => {
                engine.reset_drag();
                engine.apply_drag(x, y);
            }
        }
        self.state.apply(&update);
    }

    /// The last state pushed to the engine.
    pub fn state(&self) -> &CalibrationState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;
    use mockall::Sequence;

    fn initial(offset_x: f64, offset_y: f64) -> CalibrationState {
        CalibrationState {
            height_shift: 0.0,
            height_scale: 1.0,
            drag_offset_x: offset_x,
            drag_offset_y: offset_y,
            zoom: 1.0,
        }
    }

    fn expect_startup_sequence(engine: &mut MockTransformEngine, x: f64, y: f64) {
        let mut seq = Sequence::new();
        engine
            .expect_set_height_config()
            .with(eq(0.0), eq(1.0))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        engine
            .expect_reset_drag()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        engine
            .expect_apply_drag()
            .with(eq(x), eq(y))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
    }

    #[test]
    fn test_initialize_resets_drag_before_applying_zero_offset() {
        // Arrange
        let mut engine = MockTransformEngine::new();
        expect_startup_sequence(&mut engine, 0.0, 0.0);

        // Act
        let calibrator = Calibrator::initialize(initial(0.0, 0.0), &mut engine);

        // Assert – mock verifies order on drop
        assert_eq!(calibrator.state().drag_offset_x, 0.0);
    }

    #[test]
    fn test_initialize_resets_drag_before_applying_nonzero_offset() {
        let mut engine = MockTransformEngine::new();
        expect_startup_sequence(&mut engine, 12.5, -3.0);

        let calibrator = Calibrator::initialize(initial(12.5, -3.0), &mut engine);

        assert_eq!(
            (calibrator.state().drag_offset_x, calibrator.state().drag_offset_y),
            (12.5, -3.0)
        );
    }

    #[test]
    fn test_set_drag_is_reset_then_apply() {
        // Arrange
        let mut engine = MockTransformEngine::new();
        expect_startup_sequence(&mut engine, 5.0, 5.0);
        let mut calibrator = Calibrator::initialize(initial(5.0, 5.0), &mut engine);
        engine.checkpoint();

        let mut seq = Sequence::new();
        engine
            .expect_reset_drag()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        engine
            .expect_apply_drag()
            .with(eq(1.0), eq(2.0))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());

        // Act
        calibrator.apply(CalibrationUpdate::SetDrag { x: 1.0, y: 2.0 }, &mut engine);

        // Assert
        assert_eq!(
            (calibrator.state().drag_offset_x, calibrator.state().drag_offset_y),
            (1.0, 2.0)
        );
    }

    #[test]
    fn test_height_config_update_is_one_call() {
        // Arrange
        let mut engine = MockTransformEngine::new();
        expect_startup_sequence(&mut engine, 0.0, 0.0);
        let mut calibrator = Calibrator::initialize(initial(0.0, 0.0), &mut engine);
        engine.checkpoint();
        engine
            .expect_set_height_config()
            .with(eq(-0.5), eq(3.0))
            .times(1)
            .return_const(());

        // Act
        calibrator.apply(
            CalibrationUpdate::SetHeightConfig {
                shift: -0.5,
                scale: 3.0,
            },
            &mut engine,
        );

        // Assert
        assert_eq!(calibrator.state().height_shift, -0.5);
        assert_eq!(calibrator.state().height_scale, 3.0);
    }

    #[test]
    fn test_drag_by_accumulates_in_tracked_state() {
        let mut engine = MockTransformEngine::new();
        expect_startup_sequence(&mut engine, 1.0, 1.0);
        let mut calibrator = Calibrator::initialize(initial(1.0, 1.0), &mut engine);
        engine.checkpoint();
        engine.expect_apply_drag().times(2).return_const(());

        calibrator.apply(CalibrationUpdate::DragBy { dx: 2.0, dy: 0.0 }, &mut engine);
        calibrator.apply(CalibrationUpdate::DragBy { dx: 2.0, dy: -1.0 }, &mut engine);

        assert_eq!(
            (calibrator.state().drag_offset_x, calibrator.state().drag_offset_y),
            (5.0, 0.0)
        );
    }
}
