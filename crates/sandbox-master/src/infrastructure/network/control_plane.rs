//! Control-plane service: two TCP accept loops and one frame publisher.
//!
//! # Tasks
//!
//! ```text
//!  control port ──accept──► session task ──decode line──► CommandSender
//!                               ▲   │
//!                               │   └── {"status":"queued"|"rejected"} reply
//!                             (one per connection)
//!
//!  FrameReceiver ──► publisher task ──encode──► watch slot ──► subscriber tasks
//!                                                              (frame port)
//! ```
//!
//! The service never touches the registry or the engine.  Everything it
//! learns goes onto the command channel, and everything it publishes comes
//! off the frame channel.
//!
//! # Slow subscribers
//!
//! The publisher stores each encoded frame in a `tokio::sync::watch` slot.
//! A subscriber that is still writing the previous frame when two new ones
//! arrive only ever sees the newest, the same newest-wins rule as the frame
//! channel itself.  A new subscriber receives the latest frame immediately.
//!
//! # Request lines
//!
//! A request line may be at most [`MAX_REQUEST_LINE`] bytes.  A longer line
//! gets a `rejected` reply and the session is closed, so a client that never
//! sends a newline cannot grow the read buffer without bound.
//!
//! # Shutdown
//!
//! Every loop waits with a 200 ms timeout and then re-checks the shared
//! `running` flag, so clearing it stops the whole service within a few
//! hundred milliseconds even when nobody is connected.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use sandbox_core::protocol::codec::{encode_frame_now, encode_reply};
use sandbox_core::protocol::ControlReply;
use sandbox_core::{decode_request, SequenceCounter};
use futures_util::StreamExt;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::timeout;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

use crate::infrastructure::channel::{ChannelError, CommandSender, FrameReceiver};

/// How long any loop waits before re-checking the `running` flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(200);

/// Longest accepted request line in bytes, excluding the newline.
pub const MAX_REQUEST_LINE: usize = 64 * 1024;

type EncodedFrame = Option<Arc<Vec<u8>>>;

#[derive(Debug, Error)]
pub enum ControlPlaneError {
    #[error("failed to bind {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("control-plane task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Listener addresses for the two ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlPlaneConfig {
    pub control_addr: SocketAddr,
    pub frame_addr: SocketAddr,
}

/// The concurrently running service between the network and the simulation
/// loop.
pub struct ControlPlaneService {
    config: ControlPlaneConfig,
    commands: CommandSender,
    frames: FrameReceiver,
}

impl ControlPlaneService {
    pub fn new(config: ControlPlaneConfig, commands: CommandSender, frames: FrameReceiver) -> Self {
        Self {
            config,
            commands,
            frames,
        }
    }

    /// Binds both listeners and serves until `running` is cleared.
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError::BindFailed`] if either port cannot be
    /// bound.
    pub async fn run(self, running: Arc<AtomicBool>) -> Result<(), ControlPlaneError> {
        let control = bind(self.config.control_addr).await?;
        let frames = bind(self.config.frame_addr).await?;
        self.serve(control, frames, running).await
    }

    /// Serves on already-bound listeners until `running` is cleared.
    ///
    /// Returns once both accept loops and the publisher have stopped.  Open
    /// sessions notice the flag on their own within [`SHUTDOWN_POLL`].
    ///
    /// # Errors
    ///
    /// Returns [`ControlPlaneError::Task`] if a background task panicked.
    pub async fn serve(
        self,
        control_listener: TcpListener,
        frame_listener: TcpListener,
        running: Arc<AtomicBool>,
    ) -> Result<(), ControlPlaneError> {
        info!(
            control = %control_listener.local_addr()?,
            frames = %frame_listener.local_addr()?,
            "control plane listening"
        );

        let (frame_tx, frame_rx) = watch::channel::<EncodedFrame>(None);

        let publisher = tokio::spawn(publish_frames(self.frames, frame_tx, Arc::clone(&running)));
        let frame_accept = tokio::spawn(accept_subscribers(
            frame_listener,
            frame_rx,
            Arc::clone(&running),
        ));

        accept_control_sessions(control_listener, self.commands, Arc::clone(&running)).await;

        frame_accept.await?;
        publisher.await?;
        info!("control plane stopped");
        Ok(())
    }
}

async fn bind(addr: SocketAddr) -> Result<TcpListener, ControlPlaneError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ControlPlaneError::BindFailed { addr, source })
}

// ── Control port ──────────────────────────────────────────────────────────────

async fn accept_control_sessions(
    listener: TcpListener,
    commands: CommandSender,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::Relaxed) {
        match timeout(SHUTDOWN_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                info!("control session opened: {peer_addr}");
                let commands = commands.clone();
                let running = Arc::clone(&running);
                tokio::spawn(async move {
                    handle_control_session(stream, peer_addr, commands, running).await;
                });
            }
            Ok(Err(e)) => error!("control accept error: {e}"),
            Err(_) => {}
        }
    }
    debug!("control accept loop stopped");
}

async fn handle_control_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    commands: CommandSender,
    running: Arc<AtomicBool>,
) {
    match run_control_session(stream, commands, running).await {
        Ok(queued) => info!("control session {peer_addr} closed after {queued} queued requests"),
        Err(e) => warn!("control session {peer_addr} closed with error: {e}"),
    }
}

/// Reads request lines until EOF, shutdown, an oversized line, or a stopped
/// simulation loop.
async fn run_control_session(
    stream: TcpStream,
    commands: CommandSender,
    running: Arc<AtomicBool>,
) -> std::io::Result<u64> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = FramedRead::new(read_half, LinesCodec::new_with_max_length(MAX_REQUEST_LINE));
    let mut queued = 0u64;

    while running.load(Ordering::Relaxed) {
        let line = match timeout(SHUTDOWN_POLL, lines.next()).await {
            Err(_) => continue,
            Ok(None) => break,
            Ok(Some(Ok(line))) => line,
            Ok(Some(Err(LinesCodecError::MaxLineLengthExceeded))) => {
                warn!("request line exceeds {MAX_REQUEST_LINE} bytes; closing session");
                let reply = ControlReply::Rejected {
                    error: format!("request line exceeds {MAX_REQUEST_LINE} bytes"),
                };
                write_reply(&mut write_half, &reply).await?;
                break;
            }
            Ok(Some(Err(LinesCodecError::Io(e)))) => return Err(e),
        };
        if line.trim().is_empty() {
            continue;
        }

        let (reply, outcome) = handle_request_line(&line, &commands);
        write_reply(&mut write_half, &reply).await?;

        match outcome {
            Ok(true) => queued += 1,
            Ok(false) => {}
            Err(ChannelError::Closed) => break,
        }
    }
    Ok(queued)
}

async fn write_reply(write_half: &mut OwnedWriteHalf, reply: &ControlReply) -> std::io::Result<()> {
    let mut encoded = encode_reply(reply).map_err(std::io::Error::other)?;
    encoded.push('\n');
    write_half.write_all(encoded.as_bytes()).await
}

/// Decodes one line and enqueues it.
///
/// Returns the reply for the client and whether a command was queued.  An
/// `Err` means the simulation loop is gone and the session should end.
pub fn handle_request_line(
    line: &str,
    commands: &CommandSender,
) -> (ControlReply, Result<bool, ChannelError>) {
    let command = match decode_request(line) {
        Ok(command) => command,
        Err(e) => {
            debug!("rejecting request: {e}");
            return (
                ControlReply::Rejected {
                    error: e.to_string(),
                },
                Ok(false),
            );
        }
    };
    match commands.send(command) {
        Ok(()) => (ControlReply::Queued, Ok(true)),
        Err(e) => (
            ControlReply::Rejected {
                error: format!("simulation loop unavailable: {e}"),
            },
            Err(e),
        ),
    }
}

// ── Frame port ────────────────────────────────────────────────────────────────

/// Moves frames from the frame channel into the watch slot.
async fn publish_frames(
    frames: FrameReceiver,
    slot: watch::Sender<EncodedFrame>,
    running: Arc<AtomicBool>,
) {
    let sequence = SequenceCounter::new();
    while running.load(Ordering::Relaxed) {
        let frame = match timeout(SHUTDOWN_POLL, frames.recv()).await {
            Err(_) => continue,
            Ok(Err(ChannelError::Closed)) => {
                info!("frame channel closed; publisher stopping");
                break;
            }
            Ok(Ok(frame)) => frame,
        };
        match encode_frame_now(&frame, sequence.next()) {
            Ok(bytes) => {
                slot.send_replace(Some(Arc::new(bytes)));
            }
            Err(e) => error!("failed to encode frame: {e}"),
        }
    }
    debug!(published = sequence.current(), "frame publisher stopped");
}

async fn accept_subscribers(
    listener: TcpListener,
    slot: watch::Receiver<EncodedFrame>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::Relaxed) {
        match timeout(SHUTDOWN_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                info!("frame subscriber connected: {peer_addr}");
                let slot = slot.clone();
                let running = Arc::clone(&running);
                tokio::spawn(async move {
                    match stream_frames(stream, slot, running).await {
                        Ok(sent) => info!("frame subscriber {peer_addr} left after {sent} frames"),
                        Err(e) => warn!("frame subscriber {peer_addr} dropped: {e}"),
                    }
                });
            }
            Ok(Err(e)) => error!("frame accept error: {e}"),
            Err(_) => {}
        }
    }
    debug!("frame accept loop stopped");
}

async fn stream_frames(
    mut stream: TcpStream,
    mut slot: watch::Receiver<EncodedFrame>,
    running: Arc<AtomicBool>,
) -> std::io::Result<u64> {
    slot.mark_changed();
    let mut sent = 0u64;
    while running.load(Ordering::Relaxed) {
        match timeout(SHUTDOWN_POLL, slot.changed()).await {
            Err(_) => continue,
            Ok(Err(_)) => break,
            Ok(Ok(())) => {}
        }
        let bytes = slot.borrow_and_update().clone();
        if let Some(bytes) = bytes {
            stream.write_all(&bytes).await?;
            sent += 1;
        }
    }
    Ok(sent)
}
