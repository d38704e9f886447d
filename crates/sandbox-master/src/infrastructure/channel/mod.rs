//! The two channels connecting the control plane and the simulation loop.
//!
//! ```text
//!                  command (unbounded, FIFO)
//!  control plane ─────────────────────────────►  simulation loop
//!                ◄─────────────────────────────
//!                  frame (one slot, newest wins)
//! ```
//!
//! No other mutable state crosses the thread boundary.  Both channels are
//! safe to use from a plain OS thread (the simulation loop) and from Tokio
//! tasks (the control plane) at the same time.

use thiserror::Error;

pub mod command;
pub mod frame;

pub use command::{command_channel, CommandReceiver, CommandSender};
pub use frame::{frame_channel, FrameReceiver, FrameSender, Offer};

/// Error shared by both channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The other side of the channel has been dropped.
    #[error("channel closed")]
    Closed,
}
