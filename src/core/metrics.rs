//! Pipeline metrics for observability
//!
//! Lock-free counters describing how entries moved through the pipeline:
//! how many were accepted or rejected at the queue, how often producers had
//! to wait for space, and how sink writes turned out.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for pipeline health
///
/// # Example
///
/// ```
/// use telemetry_pipeline::PipelineMetrics;
///
/// let metrics = PipelineMetrics::new();
/// metrics.record_accepted();
/// metrics.record_write_failed();
///
/// assert_eq!(metrics.entries_accepted(), 1);
/// assert_eq!(metrics.writes_failed(), 1);
/// ```
#[derive(Debug)]
pub struct PipelineMetrics {
    /// Entries that made it into the queue
    entries_accepted: AtomicU64,

    /// Entries refused because the queue was full or the pipeline closed
    entries_rejected: AtomicU64,

    /// Times a producer found the queue full and had to wait
    block_events: AtomicU64,

    /// Entries taken off the queue and fanned out
    entries_dispatched: AtomicU64,

    /// Sink writes that returned `Ok`
    writes_succeeded: AtomicU64,

    /// Sink writes that returned an error or panicked
    writes_failed: AtomicU64,
}

impl PipelineMetrics {
    pub const fn new() -> Self {
        Self {
            entries_accepted: AtomicU64::new(0),
            entries_rejected: AtomicU64::new(0),
            block_events: AtomicU64::new(0),
            entries_dispatched: AtomicU64::new(0),
            writes_succeeded: AtomicU64::new(0),
            writes_failed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn entries_accepted(&self) -> u64 {
        self.entries_accepted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn entries_rejected(&self) -> u64 {
        self.entries_rejected.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_events(&self) -> u64 {
        self.block_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn entries_dispatched(&self) -> u64 {
        self.entries_dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn writes_succeeded(&self) -> u64 {
        self.writes_succeeded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn writes_failed(&self) -> u64 {
        self.writes_failed.load(Ordering::Relaxed)
    }

    /// Record an accepted entry, returning the previous count
    #[inline]
    pub fn record_accepted(&self) -> u64 {
        self.entries_accepted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rejected(&self) -> u64 {
        self.entries_rejected.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_block(&self) -> u64 {
        self.block_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.entries_dispatched.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_succeeded(&self) -> u64 {
        self.writes_succeeded.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_failed(&self) -> u64 {
        self.writes_failed.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed writes as a percentage of all completed writes (0.0 - 100.0)
    ///
    /// Returns 0.0 if no write has completed.
    pub fn write_failure_rate(&self) -> f64 {
        let failed = self.writes_failed() as f64;
        let total = self.writes_succeeded() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }

    pub fn reset(&self) {
        self.entries_accepted.store(0, Ordering::Relaxed);
        self.entries_rejected.store(0, Ordering::Relaxed);
        self.block_events.store(0, Ordering::Relaxed);
        self.entries_dispatched.store(0, Ordering::Relaxed);
        self.writes_succeeded.store(0, Ordering::Relaxed);
        self.writes_failed.store(0, Ordering::Relaxed);
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for PipelineMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            entries_accepted: AtomicU64::new(self.entries_accepted()),
            entries_rejected: AtomicU64::new(self.entries_rejected()),
            block_events: AtomicU64::new(self.block_events()),
            entries_dispatched: AtomicU64::new(self.entries_dispatched()),
            writes_succeeded: AtomicU64::new(self.writes_succeeded()),
            writes_failed: AtomicU64::new(self.writes_failed()),
        }
    }
}
