//! Fixed-size pool of worker threads
//!
//! Workers share one unbounded task channel. Shutting the pool down closes
//! the channel: every task already submitted still runs, then the workers
//! exit and are joined.

use super::error::{PipelineError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// A unit of work executed by exactly one worker
pub type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Default)]
struct PoolStats {
    executed: AtomicU64,
    panicked: AtomicU64,
}

/// # Example
///
/// ```
/// use telemetry_pipeline::WorkerPool;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// let pool = WorkerPool::new(2).unwrap();
/// let counter = Arc::new(AtomicUsize::new(0));
/// for _ in 0..10 {
///     let counter = Arc::clone(&counter);
///     pool.submit(move || {
///         counter.fetch_add(1, Ordering::SeqCst);
///     })
///     .unwrap();
/// }
/// pool.shutdown();
/// assert_eq!(counter.load(Ordering::SeqCst), 10);
/// ```
pub struct WorkerPool {
    sender: RwLock<Option<Sender<Task>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
    stats: Arc<PoolStats>,
}

impl WorkerPool {
    /// Spawn `worker_count` workers.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for a zero worker count, or an IO error if a
    /// thread cannot be spawned.
    pub fn new(worker_count: usize) -> Result<Self> {
        if worker_count == 0 {
            return Err(PipelineError::config(
                "WorkerPool",
                "worker count must be greater than 0",
            ));
        }

        let (sender, receiver) = unbounded::<Task>();
        let stats = Arc::new(PoolStats::default());
        let mut workers = Vec::with_capacity(worker_count);

        for id in 0..worker_count {
            let receiver = receiver.clone();
            let stats = Arc::clone(&stats);
            let spawned = thread::Builder::new()
                .name(format!("pipeline-worker-{}", id))
                .spawn(move || run_worker(id, receiver, stats));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // Let the workers that did start exit before reporting.
                    drop(sender);
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(PipelineError::io_operation(
                        "spawning worker thread",
                        format!("worker {} of {}", id, worker_count),
                        e,
                    ));
                }
            }
        }

        debug!(workers = worker_count, "worker pool started");

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(workers),
            worker_count,
            stats,
        })
    }

    /// Queue a task for execution by some worker.
    ///
    /// Tasks submitted one after another by the same caller are queued in
    /// that order; they may still run concurrently on different workers.
    ///
    /// # Errors
    ///
    /// `WorkerPoolClosed` once [`shutdown`](Self::shutdown) has started.
    pub fn submit<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.read();
        match sender.as_ref() {
            Some(sender) => sender
                .send(Box::new(task))
                .map_err(|_| PipelineError::WorkerPoolClosed),
            None => Err(PipelineError::WorkerPoolClosed),
        }
    }

    /// Stop accepting tasks, let the workers finish everything already
    /// queued, and join them. Calling it again is a no-op.
    pub fn shutdown(&self) {
        // Dropping the last sender disconnects the channel; workers keep
        // receiving until it is empty.
        let sender = self.sender.write().take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let workers = std::mem::take(&mut *self.workers.lock());
        let current = thread::current().id();
        for handle in workers {
            if handle.thread().id() == current {
                continue;
            }
            if let Err(e) = handle.join() {
                error!(panic = %panic_message(e.as_ref()), "worker thread terminated abnormally");
            }
        }

        debug!(
            executed = self.tasks_executed(),
            panicked = self.tasks_panicked(),
            "worker pool stopped"
        );
    }

    pub fn is_shutdown(&self) -> bool {
        self.sender.read().is_none()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Tasks waiting for a free worker
    pub fn pending(&self) -> usize {
        self.sender.read().as_ref().map_or(0, Sender::len)
    }

    /// Tasks that ran to completion
    pub fn tasks_executed(&self) -> u64 {
        self.stats.executed.load(Ordering::Relaxed)
    }

    /// Tasks that panicked and were contained
    pub fn tasks_panicked(&self) -> u64 {
        self.stats.panicked.load(Ordering::Relaxed)
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker(id: usize, receiver: Receiver<Task>, stats: Arc<PoolStats>) {
    // recv() fails only once the channel is disconnected and empty
    while let Ok(task) = receiver.recv() {
        match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(()) => {
                stats.executed.fetch_add(1, Ordering::Relaxed);
            }
            Err(payload) => {
                stats.panicked.fetch_add(1, Ordering::Relaxed);
                error!(
                    worker = id,
                    panic = %panic_message(payload.as_ref()),
                    "task panicked, worker continues"
                );
            }
        }
    }
    debug!(worker = id, "worker exiting");
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
