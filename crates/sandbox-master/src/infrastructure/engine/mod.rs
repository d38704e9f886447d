//! Transform engine implementations.
//!
//! # Sub-modules
//!
//! - **`height_map`** – The reference engine: turns a raw height field into a
//!   greyscale frame using the calibrated height transform and drag offset.
//!
//! - **`recording`** – Records every call in order and renders a flat frame.
//!   Used by the integration tests and for headless smoke runs.

pub mod height_map;
pub mod recording;

pub use height_map::{EngineError, HeightMapEngine};
pub use recording::{EngineCall, RecordingEngine};
