//! Network infrastructure for the master application.
//!
//! # Sub-modules
//!
//! - **`control_plane`** – The TCP control plane.  Accepts newline-delimited
//!   JSON requests on the control port and forwards them to the command
//!   channel; publishes frames from the frame channel to every subscriber on
//!   the frame port.

pub mod control_plane;

pub use control_plane::{
    ControlPlaneConfig, ControlPlaneError, ControlPlaneService, MAX_REQUEST_LINE,
};
