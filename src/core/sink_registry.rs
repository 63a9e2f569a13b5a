//! Ordered, shareable set of sinks
//!
//! The dispatcher reads the registry once per entry to decide the fan-out;
//! producers and admin code may add or remove sinks at the same time. Every
//! read takes a consistent snapshot under the lock, so a sink is either
//! fully registered or not at all.

use super::sink::LogSink;
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

/// Handle returned by [`SinkRegistry::add`], used to remove the sink later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SinkId(u64);

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink#{}", self.0)
    }
}

#[derive(Default)]
pub struct SinkRegistry {
    sinks: RwLock<Vec<(SinkId, Arc<dyn LogSink>)>>,
    next_id: AtomicU64,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, sink: Arc<dyn LogSink>) -> SinkId {
        let id = SinkId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sinks.write().push((id, sink));
        id
    }

    /// Remove a sink, flushing it. Returns the sink if it was registered.
    ///
    /// Writes already handed to the worker pool keep their own reference and
    /// still complete.
    pub fn remove(&self, id: SinkId) -> Option<Arc<dyn LogSink>> {
        let removed = {
            let mut sinks = self.sinks.write();
            let index = sinks.iter().position(|(sink_id, _)| *sink_id == id)?;
            sinks.remove(index).1
        };
        flush_sink(removed.as_ref());
        Some(removed)
    }

    /// Sinks registered right now, in insertion order
    pub fn snapshot(&self) -> Vec<Arc<dyn LogSink>> {
        self.sinks
            .read()
            .iter()
            .map(|(_, sink)| Arc::clone(sink))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sinks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.read().is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.sinks
            .read()
            .iter()
            .map(|(_, sink)| sink.name().to_string())
            .collect()
    }

    /// Flush every registered sink; failures are logged and skipped.
    pub fn flush_all(&self) {
        for sink in self.snapshot() {
            flush_sink(sink.as_ref());
        }
    }

    /// Flush and release every sink.
    pub fn clear(&self) {
        let sinks = std::mem::take(&mut *self.sinks.write());
        for (_, sink) in sinks {
            flush_sink(sink.as_ref());
        }
    }
}

fn flush_sink(sink: &dyn LogSink) {
    if let Err(e) = sink.flush() {
        warn!(sink = sink.name(), error = %e, "sink flush failed");
    }
}

impl fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkRegistry")
            .field("sinks", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogEntry, Result};
    use std::sync::atomic::AtomicUsize;

    struct CountingSink {
        name: String,
        flushes: AtomicUsize,
    }

    impl CountingSink {
        fn new(name: &str) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                flushes: AtomicUsize::new(0),
            })
        }
    }

    impl LogSink for CountingSink {
        fn write(&self, _entry: &LogEntry) -> Result<()> {
            Ok(())
        }

        fn flush(&self) -> Result<()> {
            self.flushes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn test_add_preserves_order() {
        let registry = SinkRegistry::new();
        registry.add(CountingSink::new("a"));
        registry.add(CountingSink::new("b"));
        registry.add(CountingSink::new("c"));

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.names(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_remove_flushes_and_returns_sink() {
        let registry = SinkRegistry::new();
        let sink = CountingSink::new("a");
        let id = registry.add(sink.clone());
        registry.add(CountingSink::new("b"));

        let removed = registry.remove(id).expect("sink registered");
        assert_eq!(removed.name(), "a");
        assert_eq!(sink.flushes.load(Ordering::SeqCst), 1);
        assert_eq!(registry.names(), vec!["b"]);

        assert!(registry.remove(id).is_none());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let registry = SinkRegistry::new();
        let id = registry.add(CountingSink::new("a"));
        let snapshot = registry.snapshot();

        registry.remove(id);
        registry.add(CountingSink::new("b"));

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name(), "a");
    }

    #[test]
    fn test_clear_flushes_everything() {
        let registry = SinkRegistry::new();
        let a = CountingSink::new("a");
        let b = CountingSink::new("b");
        registry.add(a.clone());
        registry.add(b.clone());

        registry.clear();

        assert!(registry.is_empty());
        assert_eq!(a.flushes.load(Ordering::SeqCst), 1);
        assert_eq!(b.flushes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let registry = SinkRegistry::new();
        let a = registry.add(CountingSink::new("a"));
        let b = registry.add(CountingSink::new("b"));
        assert_ne!(a, b);
        assert_eq!(a.to_string(), "sink#0");
    }
}
