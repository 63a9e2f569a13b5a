//! Delivery pipeline controller
//!
//! Producers hand entries to [`Dispatcher::log`]; they land in a
//! [`BoundedQueue`] and are delivered to every registered sink. Two modes:
//!
//! - [`DispatchMode::Pooled`]: one consumer thread pops entries and submits
//!   one write task per sink to a [`WorkerPool`]. Producers never wait on sink
//!   I/O. Writes for different entries may complete in any order, even for
//!   the same sink.
//! - [`DispatchMode::Synchronous`]: no threads. [`Dispatcher::flush`] writes
//!   every queued entry to every sink in the caller's thread, in entry order.

use super::{
    backpressure::BackpressurePolicy,
    bounded_queue::{BoundedQueue, PushTimeoutError, TryPushError},
    error::{PipelineError, Result},
    log_entry::LogEntry,
    metrics::PipelineMetrics,
    sink::LogSink,
    sink_registry::{SinkId, SinkRegistry},
    worker_pool::{panic_message, WorkerPool},
};
use parking_lot::Mutex;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, warn};

pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;
pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Consumer thread plus a pool of `workers` threads performing sink writes
    Pooled { workers: usize },
    /// Entries are written by whoever calls `flush`, strictly in order
    Synchronous,
}

impl Default for DispatchMode {
    fn default() -> Self {
        DispatchMode::Pooled {
            workers: DEFAULT_WORKERS,
        }
    }
}

/// Lifecycle: `Created → Running → Draining → Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DispatcherState {
    Created = 0,
    Running = 1,
    Draining = 2,
    Stopped = 3,
}

impl DispatcherState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => DispatcherState::Created,
            1 => DispatcherState::Running,
            2 => DispatcherState::Draining,
            _ => DispatcherState::Stopped,
        }
    }
}

impl fmt::Display for DispatcherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatcherState::Created => "Created",
            DispatcherState::Running => "Running",
            DispatcherState::Draining => "Draining",
            DispatcherState::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

pub struct Dispatcher {
    queue: Arc<BoundedQueue<LogEntry>>,
    sinks: Arc<SinkRegistry>,
    metrics: Arc<PipelineMetrics>,
    pool: Option<Arc<WorkerPool>>,
    consumer: Mutex<Option<JoinHandle<()>>>,
    state: AtomicU8,
    mode: DispatchMode,
    backpressure: BackpressurePolicy,
    /// Serializes synchronous flushes so batches reach sinks in queue order
    flush_lock: Mutex<()>,
    shutdown_lock: Mutex<()>,
}

impl Dispatcher {
    /// Start a pooled dispatcher with a blocking backpressure policy.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if `queue_capacity` or `workers` is zero.
    pub fn new(queue_capacity: usize, workers: usize) -> Result<Self> {
        Self::builder()
            .queue_capacity(queue_capacity)
            .workers(workers)
            .build()
    }

    /// Start a dispatcher without threads; entries are delivered by `flush`.
    pub fn synchronous(queue_capacity: usize) -> Result<Self> {
        Self::builder()
            .queue_capacity(queue_capacity)
            .synchronous()
            .build()
    }

    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    fn start(
        queue_capacity: usize,
        mode: DispatchMode,
        backpressure: BackpressurePolicy,
        initial_sinks: Vec<Arc<dyn LogSink>>,
    ) -> Result<Self> {
        let queue = Arc::new(BoundedQueue::new(queue_capacity)?);
        let sinks = Arc::new(SinkRegistry::new());
        for sink in initial_sinks {
            sinks.add(sink);
        }
        let metrics = Arc::new(PipelineMetrics::new());

        let dispatcher = Self {
            queue,
            sinks,
            metrics,
            pool: None,
            consumer: Mutex::new(None),
            state: AtomicU8::new(DispatcherState::Created as u8),
            mode,
            backpressure,
            flush_lock: Mutex::new(()),
            shutdown_lock: Mutex::new(()),
        };

        let dispatcher = match mode {
            DispatchMode::Pooled { workers } => dispatcher.spawn_consumer(workers)?,
            DispatchMode::Synchronous => dispatcher,
        };

        dispatcher.set_state(DispatcherState::Running);
        debug!(
            capacity = queue_capacity,
            mode = ?mode,
            backpressure = %backpressure,
            "dispatcher running"
        );
        Ok(dispatcher)
    }

    fn spawn_consumer(mut self, workers: usize) -> Result<Self> {
        let pool = Arc::new(WorkerPool::new(workers)?);

        let queue = Arc::clone(&self.queue);
        let sinks = Arc::clone(&self.sinks);
        let metrics = Arc::clone(&self.metrics);
        let consumer_pool = Arc::clone(&pool);

        let handle = thread::Builder::new()
            .name("pipeline-dispatcher".to_string())
            .spawn(move || {
                // pop() waits while empty and returns None once the queue is
                // closed and drained
                while let Some(entry) = queue.pop() {
                    Self::fan_out(&sinks, &metrics, &consumer_pool, entry);
                }
                debug!("dispatcher consumer exiting");
            })
            .map_err(|e| {
                pool.shutdown();
                PipelineError::io_operation("spawning dispatcher thread", "consumer loop", e)
            })?;

        self.pool = Some(pool);
        *self.consumer.get_mut() = Some(handle);
        Ok(self)
    }

    /// Submit one write task per sink registered at this moment
    fn fan_out(
        sinks: &SinkRegistry,
        metrics: &Arc<PipelineMetrics>,
        pool: &WorkerPool,
        entry: LogEntry,
    ) {
        metrics.record_dispatched();

        for sink in sinks.snapshot() {
            let entry = entry.clone();
            let task_metrics = Arc::clone(metrics);
            let submitted = pool.submit(move || {
                Self::write_to_sink(sink.as_ref(), &entry, &task_metrics);
            });

            if let Err(e) = submitted {
                metrics.record_write_failed();
                error!(error = %e, "could not hand entry to worker pool");
            }
        }
    }

    /// Write one entry to one sink.
    ///
    /// Errors and panics stay here: a failing sink never affects the other
    /// sinks or the thread running the write.
    fn write_to_sink(sink: &dyn LogSink, entry: &LogEntry, metrics: &PipelineMetrics) -> bool {
        let result = panic::catch_unwind(AssertUnwindSafe(|| sink.write(entry)));

        match result {
            Ok(Ok(())) => {
                metrics.record_write_succeeded();
                true
            }
            Ok(Err(e)) => {
                metrics.record_write_failed();
                warn!(sink = sink.name(), error = %e, "sink write failed");
                false
            }
            Err(panic_info) => {
                metrics.record_write_failed();
                error!(
                    sink = sink.name(),
                    panic = %panic_message(panic_info.as_ref()),
                    "sink panicked during write, other sinks continue"
                );
                false
            }
        }
    }

    /// Queue an entry for delivery.
    ///
    /// Returns as soon as the entry is queued; never waits for sink writes.
    /// On a full queue the configured [`BackpressurePolicy`] applies; with
    /// the default `Block` policy the caller waits for space.
    ///
    /// # Errors
    ///
    /// - `PipelineStopped` once shutdown has begun, including for callers
    ///   that were waiting for space when it began.
    /// - `QueueFull` under the `Reject` and `BlockWithTimeout` policies.
    pub fn log(&self, entry: LogEntry) -> Result<()> {
        if self.state() != DispatcherState::Running {
            self.metrics.record_rejected();
            return Err(PipelineError::PipelineStopped);
        }

        match self.queue.try_push(entry) {
            Ok(()) => {
                self.metrics.record_accepted();
                Ok(())
            }
            Err(TryPushError::Full(entry)) => self.handle_full(entry),
            Err(TryPushError::Closed(_)) => self.reject_closed(),
        }
    }

    /// Queue an entry without ever blocking, regardless of policy.
    ///
    /// # Errors
    ///
    /// `QueueFull` if there is no room, `PipelineStopped` after shutdown.
    pub fn try_log(&self, entry: LogEntry) -> Result<()> {
        if self.state() != DispatcherState::Running {
            self.metrics.record_rejected();
            return Err(PipelineError::PipelineStopped);
        }

        match self.queue.try_push(entry) {
            Ok(()) => {
                self.metrics.record_accepted();
                Ok(())
            }
            Err(TryPushError::Full(_)) => self.reject_full(),
            Err(TryPushError::Closed(_)) => self.reject_closed(),
        }
    }

    fn handle_full(&self, entry: LogEntry) -> Result<()> {
        match (self.backpressure, self.mode) {
            (BackpressurePolicy::Reject, _) => self.reject_full(),

            // Nothing else drains the queue in synchronous mode, so the
            // producer makes room itself.
            (_, DispatchMode::Synchronous) => {
                self.metrics.record_block();
                self.push_after_flush(entry)
            }

            (BackpressurePolicy::Block, DispatchMode::Pooled { .. }) => {
                self.metrics.record_block();
                match self.queue.push(entry) {
                    Ok(()) => {
                        self.metrics.record_accepted();
                        Ok(())
                    }
                    Err(_) => self.reject_closed(),
                }
            }

            (BackpressurePolicy::BlockWithTimeout(timeout), DispatchMode::Pooled { .. }) => {
                self.metrics.record_block();
                match self.queue.push_timeout(entry, timeout) {
                    Ok(()) => {
                        self.metrics.record_accepted();
                        Ok(())
                    }
                    Err(PushTimeoutError::Timeout(_)) => self.reject_full(),
                    Err(PushTimeoutError::Closed(_)) => self.reject_closed(),
                }
            }
        }
    }

    fn push_after_flush(&self, mut entry: LogEntry) -> Result<()> {
        loop {
            self.flush_queue();
            match self.queue.try_push(entry) {
                Ok(()) => {
                    self.metrics.record_accepted();
                    return Ok(());
                }
                // other producers refilled the queue meanwhile
                Err(TryPushError::Full(returned)) => entry = returned,
                Err(TryPushError::Closed(_)) => return self.reject_closed(),
            }
        }
    }

    fn reject_full(&self) -> Result<()> {
        let rejected = self.metrics.record_rejected();
        // Alert on first rejection and periodically thereafter
        if rejected == 0 || (rejected + 1) % 1000 == 0 {
            warn!(
                rejected = rejected + 1,
                capacity = self.queue.capacity(),
                "entry queue full, entries rejected"
            );
        }
        Err(PipelineError::queue_full(
            self.queue.len(),
            self.queue.capacity(),
        ))
    }

    fn reject_closed(&self) -> Result<()> {
        self.metrics.record_rejected();
        Err(PipelineError::PipelineStopped)
    }

    /// Deliver what is queued.
    ///
    /// In synchronous mode every queued entry is written to every sink, in
    /// entry order, before the sinks are flushed. In pooled mode entries are
    /// already on their way, so only the sinks' buffers are flushed.
    pub fn flush(&self) -> Result<()> {
        if self.mode == DispatchMode::Synchronous {
            self.flush_queue();
        }
        self.sinks.flush_all();
        Ok(())
    }

    /// Drain the queue and write each entry to each sink in this thread.
    /// Returns the number of entries written.
    fn flush_queue(&self) -> usize {
        let _guard = self.flush_lock.lock();

        let entries = self.queue.drain();
        if entries.is_empty() {
            return 0;
        }

        let sinks = self.sinks.snapshot();
        for entry in &entries {
            self.metrics.record_dispatched();
            for sink in &sinks {
                Self::write_to_sink(sink.as_ref(), entry, &self.metrics);
            }
        }
        entries.len()
    }

    /// Register a sink. Entries dequeued from now on are delivered to it.
    ///
    /// # Errors
    ///
    /// `PipelineStopped` once shutdown has begun.
    pub fn add_sink(&self, sink: Arc<dyn LogSink>) -> Result<SinkId> {
        if self.state() != DispatcherState::Running {
            return Err(PipelineError::PipelineStopped);
        }
        let name = sink.name().to_string();
        let id = self.sinks.add(sink);
        debug!(sink = %name, id = %id, "sink registered");
        Ok(id)
    }

    /// Unregister and flush a sink. Writes already submitted still complete.
    pub fn remove_sink(&self, id: SinkId) -> Option<Arc<dyn LogSink>> {
        let removed = self.sinks.remove(id);
        if removed.is_some() {
            debug!(id = %id, "sink removed");
        }
        removed
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn state(&self) -> DispatcherState {
        DispatcherState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: DispatcherState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn backpressure(&self) -> BackpressurePolicy {
        self.backpressure
    }

    /// Entries waiting in the queue
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Write tasks waiting for a free worker (always 0 in synchronous mode)
    pub fn pending_writes(&self) -> usize {
        self.pool.as_ref().map_or(0, |pool| pool.pending())
    }

    /// # Example
    ///
    /// ```
    /// use telemetry_pipeline::Dispatcher;
    ///
    /// let dispatcher = Dispatcher::new(100, 2).unwrap();
    /// let metrics = dispatcher.metrics();
    /// println!("accepted: {}", metrics.entries_accepted());
    /// println!("failed writes: {:.2}%", metrics.write_failure_rate());
    /// ```
    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }

    /// Stop accepting entries, deliver everything already queued, stop the
    /// worker pool and release the sinks.
    ///
    /// Producers blocked on a full queue are woken and get
    /// `PipelineStopped`. Safe to call more than once and from several
    /// threads; later calls return once the first has finished.
    pub fn shutdown(&self) {
        let _guard = self.shutdown_lock.lock();
        if self.state() == DispatcherState::Stopped {
            return;
        }

        self.set_state(DispatcherState::Draining);
        self.queue.close();

        match self.mode {
            DispatchMode::Pooled { .. } => {
                if let Some(handle) = self.consumer.lock().take() {
                    if let Err(e) = handle.join() {
                        error!(panic = %panic_message(e.as_ref()), "dispatcher consumer panicked");
                    }
                }
                if let Some(pool) = &self.pool {
                    pool.shutdown();
                }
            }
            DispatchMode::Synchronous => {
                self.flush_queue();
            }
        }

        self.sinks.clear();
        self.set_state(DispatcherState::Stopped);

        let rejected = self.metrics.entries_rejected();
        let failed = self.metrics.writes_failed();
        if rejected > 0 || failed > 0 {
            warn!(
                rejected,
                failed_writes = failed,
                "dispatcher stopped with undelivered output"
            );
        } else {
            debug!(
                dispatched = self.metrics.entries_dispatched(),
                "dispatcher stopped"
            );
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &self.state())
            .field("mode", &self.mode)
            .field("backpressure", &self.backpressure)
            .field("queue", &self.queue)
            .field("sinks", &self.sinks)
            .finish()
    }
}

/// Builder for constructing a [`Dispatcher`] with a fluent API
///
/// # Example
/// ```
/// use telemetry_pipeline::prelude::*;
/// use std::time::Duration;
///
/// let dispatcher = Dispatcher::builder()
///     .queue_capacity(256)
///     .workers(2)
///     .backpressure(BackpressurePolicy::BlockWithTimeout(Duration::from_millis(50)))
///     .sink(ConsoleSink::new())
///     .build()
///     .unwrap();
/// assert_eq!(dispatcher.sink_count(), 1);
/// ```
pub struct DispatcherBuilder {
    queue_capacity: usize,
    mode: DispatchMode,
    backpressure: BackpressurePolicy,
    sinks: Vec<Arc<dyn LogSink>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            mode: DispatchMode::default(),
            backpressure: BackpressurePolicy::default(),
            sinks: Vec::new(),
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Use pooled mode with this many write workers
    #[must_use = "builder methods return a new value"]
    pub fn workers(mut self, workers: usize) -> Self {
        self.mode = DispatchMode::Pooled { workers };
        self
    }

    /// Use synchronous mode: no threads, delivery on `flush`
    #[must_use = "builder methods return a new value"]
    pub fn synchronous(mut self) -> Self {
        self.mode = DispatchMode::Synchronous;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn mode(mut self, mode: DispatchMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn backpressure(mut self, policy: BackpressurePolicy) -> Self {
        self.backpressure = policy;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn sink<S: LogSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Add a sink the caller keeps a handle to
    #[must_use = "builder methods return a new value"]
    pub fn shared_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Validate the settings and start the dispatcher
    pub fn build(self) -> Result<Dispatcher> {
        Dispatcher::start(self.queue_capacity, self.mode, self.backpressure, self.sinks)
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}
