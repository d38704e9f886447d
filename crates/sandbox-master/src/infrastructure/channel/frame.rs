//! Single-slot frame channel with drop-and-replace semantics.
//!
//! The simulation loop offers one frame per iteration.  If the previous frame
//! has not been taken yet it is replaced, so a slow consumer skips frames and
//! never receives a stale one.  [`FrameSender::offer`] never blocks.
//!
//! # Why not a bounded `mpsc` of capacity 1? (for beginners)
//!
//! A bounded queue that is full either blocks the producer or rejects the
//! *new* item (`try_send` fails).  Both are wrong here: the newest frame is the
//! one that matters.  The slot below keeps the newest and discards the older.
//!
//! # Wake-ups
//!
//! The consumer waits on a [`Notify`].  `notify_one` stores a permit when no
//! task is waiting yet, so an offer that races with the consumer's emptiness
//! check is never lost.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};

use sandbox_core::Frame;
use tokio::sync::Notify;

use super::ChannelError;

/// What happened to the slot when a frame was offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// The slot was empty; the frame was stored.
    Stored,
    /// An unconsumed frame was discarded in favour of the new one.
    Replaced,
}

#[derive(Debug)]
struct Slot {
    frame: Mutex<Option<Arc<Frame>>>,
    notify: Notify,
    sender_alive: AtomicBool,
    receiver_alive: AtomicBool,
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, Option<Arc<Frame>>> {
        // Poisoning is ignored: the slot only ever holds a whole `Option`.
        self.frame.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Creates a connected frame sender/receiver pair with an empty slot.
pub fn frame_channel() -> (FrameSender, FrameReceiver) {
    let slot = Arc::new(Slot {
        frame: Mutex::new(None),
        notify: Notify::new(),
        sender_alive: AtomicBool::new(true),
        receiver_alive: AtomicBool::new(true),
    });
    (
        FrameSender {
            slot: Arc::clone(&slot),
        },
        FrameReceiver { slot },
    )
}

/// Producer half, owned by the simulation loop.
#[derive(Debug)]
pub struct FrameSender {
    slot: Arc<Slot>,
}

impl FrameSender {
    /// Places `frame` in the slot, replacing any unconsumed frame.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] if the receiver has been dropped.
    pub fn offer(&self, frame: Arc<Frame>) -> Result<Offer, ChannelError> {
        if !self.slot.receiver_alive.load(Ordering::Acquire) {
            return Err(ChannelError::Closed);
        }
        let previous = self.slot.lock().replace(frame);
        self.slot.notify.notify_one();
        Ok(if previous.is_some() {
            Offer::Replaced
        } else {
            Offer::Stored
        })
    }

    /// Returns `true` if the receiver has been dropped.
    pub fn is_closed(&self) -> bool {
        !self.slot.receiver_alive.load(Ordering::Acquire)
    }
}

impl Drop for FrameSender {
    fn drop(&mut self) {
        self.slot.sender_alive.store(false, Ordering::Release);
        self.slot.notify.notify_one();
    }
}

/// Consumer half, owned by the control plane's frame publisher.
#[derive(Debug)]
pub struct FrameReceiver {
    slot: Arc<Slot>,
}

impl FrameReceiver {
    /// Takes the frame in the slot, leaving it empty.
    ///
    /// A frame offered just before the sender was dropped is still delivered.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] when the slot is empty and the sender
    /// has been dropped.
    pub fn try_take(&self) -> Result<Option<Arc<Frame>>, ChannelError> {
        if let Some(frame) = self.slot.lock().take() {
            return Ok(Some(frame));
        }
        if !self.slot.sender_alive.load(Ordering::Acquire) {
            return Err(ChannelError::Closed);
        }
        Ok(None)
    }

    /// Waits until a frame is available and takes it.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Closed`] when the sender is dropped while the
    /// slot is empty.
    pub async fn recv(&self) -> Result<Arc<Frame>, ChannelError> {
        loop {
            if let Some(frame) = self.try_take()? {
                return Ok(frame);
            }
            self.slot.notify.notified().await;
        }
    }
}

impl Drop for FrameReceiver {
    fn drop(&mut self) {
        self.slot.receiver_alive.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn frame_with(value: u8) -> Arc<Frame> {
        let mut frame = Frame::new(4, 4).expect("valid dimensions");
        frame.fill(value);
        Arc::new(frame)
    }

    #[test]
    fn test_empty_slot_yields_nothing() {
        let (_tx, rx) = frame_channel();
        assert_eq!(rx.try_take(), Ok(None));
    }

    #[test]
    fn test_second_offer_replaces_unconsumed_first() {
        // Arrange
        let (tx, rx) = frame_channel();

        // Act
        let first = tx.offer(frame_with(1)).unwrap();
        let second = tx.offer(frame_with(2)).unwrap();

        // Assert – consumer only ever sees the second frame
        assert_eq!(first, Offer::Stored);
        assert_eq!(second, Offer::Replaced);
        let taken = rx.try_take().unwrap().expect("frame available");
        assert_eq!(taken.get(0, 0), Some(2));
        assert_eq!(rx.try_take(), Ok(None), "the first frame must be gone");
    }

    #[test]
    fn test_offer_after_take_stores_again() {
        let (tx, rx) = frame_channel();
        tx.offer(frame_with(1)).unwrap();
        rx.try_take().unwrap();
        assert_eq!(tx.offer(frame_with(2)).unwrap(), Offer::Stored);
    }

    #[test]
    fn test_offer_never_blocks_without_consumer_activity() {
        // Arrange
        let (tx, rx) = frame_channel();

        // Act – far more offers than the slot can hold
        for value in 0..=200u8 {
            tx.offer(frame_with(value)).unwrap();
        }

        // Assert
        assert_eq!(rx.try_take().unwrap().unwrap().get(3, 3), Some(200));
    }

    #[test]
    fn test_offer_fails_once_receiver_dropped() {
        let (tx, rx) = frame_channel();
        drop(rx);
        assert!(tx.is_closed());
        assert_eq!(tx.offer(frame_with(0)), Err(ChannelError::Closed));
    }

    #[test]
    fn test_last_frame_is_delivered_after_sender_dropped() {
        // Arrange
        let (tx, rx) = frame_channel();
        tx.offer(frame_with(9)).unwrap();

        // Act
        drop(tx);

        // Assert
        assert_eq!(rx.try_take().unwrap().unwrap().get(0, 0), Some(9));
        assert_eq!(rx.try_take(), Err(ChannelError::Closed));
    }

    #[tokio::test]
    async fn test_recv_wakes_when_frame_offered_from_another_thread() {
        // Arrange
        let (tx, rx) = frame_channel();

        // Act
        let producer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            tx.offer(frame_with(7)).unwrap();
            tx
        });
        let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("recv must not time out")
            .expect("channel open");

        // Assert
        assert_eq!(frame.get(1, 1), Some(7));
        drop(producer.join().expect("producer thread"));
    }

    #[tokio::test]
    async fn test_recv_reports_closed_when_sender_dropped() {
        let (tx, rx) = frame_channel();
        drop(tx);
        assert_eq!(rx.recv().await, Err(ChannelError::Closed));
    }
}
