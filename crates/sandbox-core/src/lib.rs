//! # sandbox-core
//!
//! Shared library for the augmented sandbox coordinator containing the domain
//! entities and the control-plane framing.
//!
//! This crate is used by the master application and by any tool that talks to
//! its control plane.  It has zero dependencies on OS APIs, async runtimes, or
//! network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! An augmented sandbox is a box of sand with a depth camera ("kinect") above
//! it and a projector ("beamer") pointing down at it.  The camera measures the
//! height of the sand; the master turns those heights into an image and the
//! projector paints it back onto the sand, so valleys turn blue and hills turn
//! green in real time.
//!
//! This crate (`sandbox-core`) is the shared foundation.  It defines:
//!
//! - **`domain`** – Pure data with no I/O: client records, the calibration
//!   state that maps raw heights to image brightness, and the greyscale
//!   [`Frame`] that is projected.
//!
//! - **`protocol`** – How requests and frames travel over the network.
//!   Requests are newline-delimited JSON decoded into [`Command`] values;
//!   frames are encoded into a compact binary format (24-byte header +
//!   dimensions + pixels).

pub mod domain;
pub mod protocol;

pub use domain::calibration::{CalibrationState, CalibrationUpdate};
pub use domain::client::{ClientId, ClientKind, ClientRecord, UnknownClientKind};
pub use domain::command::Command;
pub use domain::frame::{Frame, FrameError};
pub use protocol::codec::{decode_frame, decode_request, encode_frame, ProtocolError};
pub use protocol::sequence::SequenceCounter;
