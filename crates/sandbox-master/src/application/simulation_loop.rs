//! The main simulation loop.
//!
//! The loop owns the client registry, the calibration state, the transform
//! engine and the frame buffer.  Nothing else can reach them; the control
//! plane talks to the loop only through the command and frame channels.
//!
//! # One iteration
//!
//! ```text
//!            ┌──────── command pending? ────────┐
//!            │ yes                           no │
//!            ▼                                  ▼
//!   dequeue ONE, dispatch              (Idle)  sleep poll_interval
//!   (Dispatching)                               │
//!            └──────────────┬───────────────────┘
//!                           ▼
//!            render into frame, offer to frame channel
//! ```
//!
//! The sleep runs after the frame is offered, so every iteration publishes
//! exactly one frame.  A burst of N queued commands takes N iterations and no
//! sleeps.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use sandbox_core::{CalibrationState, Command, Frame};
use tracing::{debug, info, trace, warn};

use crate::application::calibrate::{Calibrator, TransformEngine};
use crate::application::dispatch_command::{dispatch, DispatchOutcome};
use crate::application::manage_clients::ClientRegistry;
use crate::infrastructure::channel::{ChannelError, CommandReceiver, FrameSender, Offer};

/// Upper bound on one uninterrupted sleep, so a cleared `running` flag is seen
/// promptly even with a long poll interval.
const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Default time the loop sleeps when no command is pending.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What an iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// No command was pending.
    Idle,
    /// Exactly one command was dequeued and dispatched.
    Dispatching,
}

/// Counters kept across iterations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub iterations: u64,
    pub commands_applied: u64,
    pub commands_rejected: u64,
    pub frames_offered: u64,
    /// Frames discarded because the consumer had not taken the previous one.
    pub frames_replaced: u64,
}

/// The single consumer of the command channel and producer of frames.
pub struct SimulationLoop<E: TransformEngine> {
    registry: ClientRegistry,
    calibrator: Calibrator,
    engine: E,
    commands: CommandReceiver,
    frames: FrameSender,
    frame: Frame,
    poll_interval: Duration,
    stats: LoopStats,
}

impl<E: TransformEngine> SimulationLoop<E> {
    /// Builds the loop and pushes the start-up calibration into `engine`.
    ///
    /// `frame` fixes the output resolution for the lifetime of the loop.
    pub fn new(
        mut engine: E,
        initial: CalibrationState,
        frame: Frame,
        commands: CommandReceiver,
        frames: FrameSender,
    ) -> Self {
        let calibrator = Calibrator::initialize(initial, &mut engine);
        info!(
            width = frame.width(),
            height = frame.height(),
            "simulation loop initialised"
        );
        Self {
            registry: ClientRegistry::new(),
            calibrator,
            engine,
            commands,
            frames,
            frame,
            poll_interval: DEFAULT_POLL_INTERVAL,
            stats: LoopStats::default(),
        }
    }

    /// Overrides the idle sleep.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Runs one iteration without sleeping.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] when every command sender is gone and
    /// the queue is drained, or when the frame receiver is gone.  Rejected
    /// commands are not errors here; they are logged and dropped.
    pub fn step(&mut self) -> Result<LoopState, ChannelError> {
        self.stats.iterations += 1;

        let state = match self.commands.try_recv()? {
            Some(command) => {
                self.dispatch_one(command);
                LoopState::Dispatching
            }
            None => LoopState::Idle,
        };

        self.publish_frame()?;
        trace!(?state, iteration = self.stats.iterations, "iteration complete");
        Ok(state)
    }

    /// Runs iterations until `running` is cleared or a channel closes.
    ///
    /// Blocks the calling thread; the caller runs it on a dedicated thread.
    ///
    /// # Errors
    ///
    /// Propagates [`ChannelError::Closed`] from [`step`](Self::step).
    pub fn run(&mut self, running: &AtomicBool) -> Result<(), ChannelError> {
        info!(poll_interval_ms = self.poll_interval.as_millis() as u64, "simulation loop running");
        while running.load(Ordering::Relaxed) {
            if self.step()? == LoopState::Idle {
                sleep_while_running(self.poll_interval, running);
            }
        }
        info!(stats = ?self.stats, "simulation loop stopped");
        Ok(())
    }

    fn dispatch_one(&mut self, command: Command) {
        let label = command.label();
        match dispatch(
            command,
            &mut self.registry,
            &mut self.calibrator,
            &mut self.engine,
        ) {
            Ok(DispatchOutcome::Registered { kind, id }) => {
                self.stats.commands_applied += 1;
                info!(%kind, id, "client registered");
            }
            Ok(DispatchOutcome::Calibrated(update)) => {
                self.stats.commands_applied += 1;
                info!(?update, "calibration updated");
            }
            Err(e) => {
                self.stats.commands_rejected += 1;
                warn!(command = label, "command dropped: {e}");
            }
        }
    }

    fn publish_frame(&mut self) -> Result<(), ChannelError> {
        self.engine.render(&mut self.frame);
        let offer = self.frames.offer(Arc::new(self.frame.clone()))?;
        self.stats.frames_offered += 1;
        if offer == Offer::Replaced {
            self.stats.frames_replaced += 1;
            debug!("previous frame not consumed; replaced");
        }
        Ok(())
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    pub fn calibration(&self) -> &CalibrationState {
        self.calibrator.state()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

/// Sleeps for `duration` in slices, returning early once `running` is cleared.
fn sleep_while_running(duration: Duration, running: &AtomicBool) {
    let deadline = Instant::now() + duration;
    loop {
        let now = Instant::now();
        if now >= deadline || !running.load(Ordering::Relaxed) {
            return;
        }
        std::thread::sleep((deadline - now).min(SLEEP_SLICE));
    }
}
