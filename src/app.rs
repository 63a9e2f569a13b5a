//! Wires sources, formatters and the dispatcher into a polling loop

use crate::config::AppConfig;
use crate::core::{Dispatcher, LogSink, PipelineError, Result};
use crate::formatter::{LogFormatter, TelemetryType};
use crate::sinks::create_sink;
use crate::sources::{create_source, TelemetrySource};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Upper bound on how long `run` sleeps before rechecking the stop flag
const MAX_IDLE: Duration = Duration::from_millis(100);

struct SourceSlot {
    source: Box<dyn TelemetrySource>,
    formatter: LogFormatter,
    interval: Duration,
    next_poll: Instant,
    exhausted: bool,
}

/// Counters from one call to [`TelemetryApp::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub readings: u64,
    pub skipped: u64,
    pub invalid: u64,
    pub logged: u64,
    pub rejected: u64,
}

pub struct TelemetryApp {
    app_name: String,
    dispatcher: Dispatcher,
    sources: Vec<SourceSlot>,
}

impl TelemetryApp {
    /// Validate `config`, build its sinks and sources and start the dispatcher.
    ///
    /// Sources are not opened yet; call [`open_sources`](Self::open_sources).
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let sinks = config
            .sinks
            .iter()
            .map(create_sink)
            .collect::<Result<Vec<Arc<dyn LogSink>>>>()?;

        let mut builder = Dispatcher::builder()
            .queue_capacity(config.pipeline.queue_capacity)
            .mode(config.pipeline.dispatch_mode())
            .backpressure(config.pipeline.backpressure);
        for sink in sinks {
            builder = builder.shared_sink(sink);
        }
        let dispatcher = builder.build()?;

        let mut app = Self {
            app_name: config.app_name,
            dispatcher,
            sources: Vec::new(),
        };

        for source_config in &config.sources {
            let source = create_source(source_config)?;
            app.add_source(
                source,
                source_config.telemetry_type,
                Duration::from_millis(source_config.poll_interval_ms),
            )?;
        }

        Ok(app)
    }

    /// Register a source built by the caller, such as a `ProxySource`.
    pub fn add_source(
        &mut self,
        source: Box<dyn TelemetrySource>,
        telemetry_type: TelemetryType,
        interval: Duration,
    ) -> Result<()> {
        if interval.is_zero() {
            return Err(PipelineError::config(
                source.name(),
                "poll interval must be greater than 0",
            ));
        }
        self.sources.push(SourceSlot {
            formatter: LogFormatter::new(self.app_name.clone(), telemetry_type.default_policy()),
            source,
            interval,
            next_poll: Instant::now(),
            exhausted: false,
        });
        Ok(())
    }

    /// Open every source. Unavailable sources are logged and dropped.
    /// Returns the number of sources left.
    pub fn open_sources(&mut self) -> usize {
        self.sources.retain_mut(|slot| match slot.source.open() {
            Ok(()) => {
                debug!(source = slot.source.name(), "source opened");
                true
            }
            Err(e) => {
                warn!(source = slot.source.name(), error = %e, "source unavailable, skipping");
                false
            }
        });
        self.sources.len()
    }

    /// Poll sources until `stop` is set or every source has closed.
    ///
    /// Each source is read once per poll interval. Readings that are not
    /// numbers are logged and dropped. Stops early if the dispatcher has
    /// been shut down.
    pub fn run(&mut self, stop: &AtomicBool) -> RunSummary {
        let mut summary = RunSummary::default();
        info!(app = %self.app_name, sources = self.sources.len(), "polling started");

        while !stop.load(Ordering::Relaxed) {
            let now = Instant::now();
            let mut next_wake = now + MAX_IDLE;
            let mut active = 0;

            for slot in self.sources.iter_mut().filter(|slot| !slot.exhausted) {
                active += 1;
                if now >= slot.next_poll {
                    slot.next_poll = now + slot.interval;
                    if Self::poll(&self.dispatcher, slot, &mut summary).is_err() {
                        info!(app = %self.app_name, "dispatcher stopped, polling ends");
                        return summary;
                    }
                }
                next_wake = next_wake.min(slot.next_poll);
            }

            if active == 0 {
                debug!("all sources exhausted");
                break;
            }

            let now = Instant::now();
            if next_wake > now {
                thread::sleep(next_wake - now);
            }
        }

        info!(
            readings = summary.readings,
            logged = summary.logged,
            invalid = summary.invalid,
            rejected = summary.rejected,
            "polling finished"
        );
        summary
    }

    /// Read one reading from `slot` and hand it to the dispatcher.
    /// Fails only once the dispatcher refuses all further entries.
    fn poll(dispatcher: &Dispatcher, slot: &mut SourceSlot, summary: &mut RunSummary) -> Result<()> {
        let raw = match slot.source.read() {
            Some(raw) => raw,
            None => {
                debug!(source = slot.source.name(), "source exhausted");
                slot.exhausted = true;
                return Ok(());
            }
        };
        summary.readings += 1;

        if raw.trim().is_empty() {
            summary.skipped += 1;
            return Ok(());
        }

        let entry = match slot.formatter.format(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                summary.invalid += 1;
                warn!(source = slot.source.name(), error = %e, "dropping reading");
                return Ok(());
            }
        };

        match dispatcher.log(entry) {
            Ok(()) => {
                summary.logged += 1;
                Ok(())
            }
            Err(PipelineError::PipelineStopped) => Err(PipelineError::PipelineStopped),
            Err(e) => {
                summary.rejected += 1;
                warn!(source = slot.source.name(), error = %e, "entry not accepted");
                Ok(())
            }
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Deliver everything accepted so far and stop the pipeline
    pub fn shutdown(&self) {
        self.dispatcher.shutdown();
    }
}
