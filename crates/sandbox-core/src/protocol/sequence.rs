//! Thread-safe sequence counter for frame numbering.
//!
//! Every frame sent to a subscriber carries a monotonically increasing
//! sequence number.  Because the frame channel drops frames a slow consumer
//! never picked up, gaps in the sequence are expected: a subscriber that sees
//! 4 after 1 knows two frames were replaced before it could read them.
//!
//! # Thread safety
//!
//! The counter uses `AtomicU64` internally, so the frame publisher and any
//! diagnostic reader can share it without a lock.

use std::sync::atomic::{AtomicU64, Ordering};

/// A thread-safe, monotonically increasing counter for protocol sequence numbers.
///
/// Sequence numbers start at 0 and increment by 1 with each call to [`next`].
/// The counter wraps around at `u64::MAX` back to 0 without panicking.
///
/// # Examples
///
/// ```rust
/// use sandbox_core::SequenceCounter;
///
/// let counter = SequenceCounter::new();
/// assert_eq!(counter.next(), 0);
/// assert_eq!(counter.next(), 1);
/// ```
///
/// [`next`]: SequenceCounter::next
#[derive(Debug)]
pub struct SequenceCounter {
    inner: AtomicU64,
}

impl SequenceCounter {
    /// Creates a new counter starting at 0.
    pub fn new() -> Self {
        Self {
            inner: AtomicU64::new(0),
        }
    }

    /// Returns the next sequence number and atomically increments the counter.
    ///
    /// `Ordering::Relaxed` is sufficient: sequence numbers order frames, they
    /// do not synchronise memory between threads.
    pub fn next(&self) -> u64 {
        self.inner.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the current value without incrementing.
    pub fn current(&self) -> u64 {
        self.inner.load(Ordering::Relaxed)
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}
