//! Unbounded multi-producer, single-consumer command queue.
//!
//! Producers (control-plane sessions) never block.  The consumer (the
//! simulation loop) polls with [`CommandReceiver::try_recv`] and sleeps on its
//! own when the queue is empty, so it never waits inside the channel.

use sandbox_core::Command;
use tokio::sync::mpsc::{self, error::TryRecvError};

use super::ChannelError;

/// Creates a connected command sender/receiver pair.
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandSender { tx }, CommandReceiver { rx })
}

/// Producer half.  Cheap to clone; one clone per control-plane session.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<Command>,
}

impl CommandSender {
    /// Enqueues a command without blocking.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] once the simulation loop has dropped
    /// its receiver.
    pub fn send(&self, command: Command) -> Result<(), ChannelError> {
        self.tx.send(command).map_err(|_| ChannelError::Closed)
    }

    /// Returns `true` if the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half, owned by the simulation loop.
#[derive(Debug)]
pub struct CommandReceiver {
    rx: mpsc::UnboundedReceiver<Command>,
}

impl CommandReceiver {
    /// Dequeues the oldest pending command, if any, without blocking.
    ///
    /// Commands still queued when the last sender is dropped are delivered
    /// before the channel reports closed.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] when the queue is empty and every
    /// sender has been dropped.
    pub fn try_recv(&mut self) -> Result<Option<Command>, ChannelError> {
        match self.rx.try_recv() {
            Ok(command) => Ok(Some(command)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ChannelError::Closed),
        }
    }

    /// Number of commands waiting to be dispatched.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
