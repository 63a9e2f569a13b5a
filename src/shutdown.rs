//! Termination signal handling
//!
//! SIGINT and SIGTERM raise a stop flag instead of killing the process, so
//! the polling loop ends normally and the dispatcher drains every accepted
//! entry before exit.

use crate::core::{PipelineError, Result};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::runtime::{Builder, Runtime};
use tokio::signal;
use tracing::{info, warn};

/// Spawn a thread that sets `stop` on the first SIGINT or SIGTERM.
///
/// The thread is detached in normal use; it only returns after a signal.
pub fn stop_on_signal(stop: Arc<AtomicBool>) -> Result<JoinHandle<()>> {
    spawn_watcher(stop, wait_for_signal)
}

fn spawn_watcher<F, Fut>(stop: Arc<AtomicBool>, signal: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = &'static str>,
{
    let runtime = build_runtime()?;
    thread::Builder::new()
        .name("signal-watcher".to_string())
        .spawn(move || {
            let received = runtime.block_on(signal());
            info!(signal = received, "stop requested, draining pipeline");
            stop.store(true, Ordering::SeqCst);
        })
        .map_err(|e| PipelineError::io_operation("spawning signal watcher", "signal-watcher", e))
}

fn build_runtime() -> Result<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| PipelineError::io_operation("building signal runtime", "signal-watcher", e))
}

/// Resolve with the name of the first termination signal received.
/// A handler that cannot be installed never fires.
async fn wait_for_signal() -> &'static str {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => "SIGINT",
        () = terminate => "SIGTERM",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_sets_stop_flag() {
        let stop = Arc::new(AtomicBool::new(false));
        let watcher = spawn_watcher(Arc::clone(&stop), || async { "SIGTERM" }).unwrap();

        watcher.join().unwrap();
        assert!(stop.load(Ordering::SeqCst));
    }

    #[test]
    fn test_flag_untouched_until_signal() {
        let stop = Arc::new(AtomicBool::new(false));
        let watcher = stop_on_signal(Arc::clone(&stop)).unwrap();

        thread::sleep(std::time::Duration::from_millis(20));
        assert!(!stop.load(Ordering::SeqCst));
        assert!(!watcher.is_finished());
    }
}
