//! Fixed-capacity, thread-safe FIFO ring
//!
//! The queue sits between producers calling `Dispatcher::log` and the
//! dispatcher's consumer. It never grows: a full queue either rejects a
//! value (`try_push`) or makes the caller wait (`push`, `push_timeout`).
//! Closing the queue wakes every waiter; producers are refused from then on
//! while consumers may still drain what is left.

use super::error::{PipelineError, Result};
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::time::{Duration, Instant};

/// Error returned by [`BoundedQueue::try_push`]. The rejected value is handed back.
pub enum TryPushError<T> {
    Full(T),
    Closed(T),
}

impl<T> TryPushError<T> {
    pub fn into_inner(self) -> T {
        match self {
            TryPushError::Full(value) | TryPushError::Closed(value) => value,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, TryPushError::Full(_))
    }
}

impl<T> fmt::Debug for TryPushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryPushError::Full(_) => f.write_str("Full(..)"),
            TryPushError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

impl<T> fmt::Display for TryPushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryPushError::Full(_) => f.write_str("pushing into a full queue"),
            TryPushError::Closed(_) => f.write_str("pushing into a closed queue"),
        }
    }
}

impl<T> std::error::Error for TryPushError<T> {}

/// Error returned by [`BoundedQueue::push`] when the queue was closed.
pub struct PushError<T>(pub T);

impl<T> fmt::Debug for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PushError(..)")
    }
}

impl<T> fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("pushing into a closed queue")
    }
}

impl<T> std::error::Error for PushError<T> {}

/// Error returned by [`BoundedQueue::push_timeout`].
pub enum PushTimeoutError<T> {
    Timeout(T),
    Closed(T),
}

impl<T> PushTimeoutError<T> {
    pub fn into_inner(self) -> T {
        match self {
            PushTimeoutError::Timeout(value) | PushTimeoutError::Closed(value) => value,
        }
    }
}

impl<T> fmt::Debug for PushTimeoutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushTimeoutError::Timeout(_) => f.write_str("Timeout(..)"),
            PushTimeoutError::Closed(_) => f.write_str("Closed(..)"),
        }
    }
}

impl<T> fmt::Display for PushTimeoutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushTimeoutError::Timeout(_) => f.write_str("timed out waiting for queue space"),
            PushTimeoutError::Closed(_) => f.write_str("pushing into a closed queue"),
        }
    }
}

impl<T> std::error::Error for PushTimeoutError<T> {}

struct Ring<T> {
    slots: Box<[Option<T>]>,
    /// next slot to write
    head: usize,
    /// next slot to read
    tail: usize,
    count: usize,
    closed: bool,
}

impl<T> Ring<T> {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            head: 0,
            tail: 0,
            count: 0,
            closed: false,
        }
    }

    #[inline]
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    fn put(&mut self, value: T) {
        debug_assert!(!self.is_full());
        self.slots[self.head] = Some(value);
        self.head = (self.head + 1) % self.capacity();
        self.count += 1;
    }

    fn take(&mut self) -> Option<T> {
        if self.count == 0 {
            return None;
        }
        let value = self.slots[self.tail].take();
        self.tail = (self.tail + 1) % self.capacity();
        self.count -= 1;
        value
    }
}

/// Bounded multi-producer, multi-consumer FIFO queue.
///
/// # Example
///
/// ```
/// use telemetry_pipeline::BoundedQueue;
///
/// let queue = BoundedQueue::new(2).unwrap();
/// assert!(queue.try_push(1).is_ok());
/// assert!(queue.try_push(2).is_ok());
/// assert!(queue.try_push(3).unwrap_err().is_full());
///
/// assert_eq!(queue.try_pop(), Some(1));
/// assert_eq!(queue.len(), 1);
/// ```
pub struct BoundedQueue<T> {
    ring: Mutex<Ring<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when `capacity` is zero.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(PipelineError::config(
                "BoundedQueue",
                "capacity must be greater than 0",
            ));
        }

        Ok(Self {
            ring: Mutex::new(Ring::with_capacity(capacity)),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        })
    }

    /// Store `value` at the head if there is room, without blocking.
    pub fn try_push(&self, value: T) -> std::result::Result<(), TryPushError<T>> {
        let mut ring = self.ring.lock();
        if ring.closed {
            return Err(TryPushError::Closed(value));
        }
        if ring.is_full() {
            return Err(TryPushError::Full(value));
        }
        ring.put(value);
        drop(ring);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Store `value`, waiting for room if the queue is full.
    ///
    /// Fails only if the queue is closed before room becomes available.
    pub fn push(&self, value: T) -> std::result::Result<(), PushError<T>> {
        let mut ring = self.ring.lock();
        loop {
            if ring.closed {
                return Err(PushError(value));
            }
            if !ring.is_full() {
                ring.put(value);
                drop(ring);
                self.not_empty.notify_one();
                return Ok(());
            }
            self.not_full.wait(&mut ring);
        }
    }

    /// Like [`push`](Self::push), but gives up after `timeout`.
    pub fn push_timeout(
        &self,
        value: T,
        timeout: Duration,
    ) -> std::result::Result<(), PushTimeoutError<T>> {
        let deadline = Instant::now() + timeout;
        let mut ring = self.ring.lock();
        loop {
            if ring.closed {
                return Err(PushTimeoutError::Closed(value));
            }
            if !ring.is_full() {
                ring.put(value);
                drop(ring);
                self.not_empty.notify_one();
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(PushTimeoutError::Timeout(value));
            }
            self.not_full.wait_until(&mut ring, deadline);
        }
    }

    /// Remove the oldest value, without blocking.
    pub fn try_pop(&self) -> Option<T> {
        let value = self.ring.lock().take();
        if value.is_some() {
            self.not_full.notify_one();
        }
        value
    }

    /// Remove the oldest value, waiting while the queue is empty.
    ///
    /// Returns `None` once the queue is closed and fully drained.
    pub fn pop(&self) -> Option<T> {
        let mut ring = self.ring.lock();
        loop {
            if let Some(value) = ring.take() {
                drop(ring);
                self.not_full.notify_one();
                return Some(value);
            }
            if ring.closed {
                return None;
            }
            self.not_empty.wait(&mut ring);
        }
    }

    /// Remove every queued value in FIFO order.
    pub fn drain(&self) -> Vec<T> {
        let mut ring = self.ring.lock();
        let mut values = Vec::with_capacity(ring.count);
        while let Some(value) = ring.take() {
            values.push(value);
        }
        drop(ring);
        self.not_full.notify_all();
        values
    }

    /// Discard every queued value.
    pub fn clear(&self) {
        drop(self.drain());
    }

    /// Refuse further pushes and wake every waiting producer and consumer.
    ///
    /// Values already queued stay poppable.
    pub fn close(&self) {
        self.ring.lock().closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.ring.lock().closed
    }

    pub fn len(&self) -> usize {
        self.ring.lock().count
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.ring.lock().count == 0
    }

    pub fn is_full(&self) -> bool {
        self.ring.lock().is_full()
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ring = self.ring.lock();
        f.debug_struct("BoundedQueue")
            .field("capacity", &self.capacity)
            .field("len", &ring.count)
            .field("closed", &ring.closed)
            .finish()
    }
}
