//! `telemetry-pipeline` command-line entry point
//!
//! Loads a JSON configuration, opens the configured sources and polls them
//! until every source closes, the optional duration elapses, or SIGINT or
//! SIGTERM arrives. Every accepted entry is delivered before exit.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use telemetry_pipeline::{shutdown, AppConfig, PipelineError, Result, TelemetryApp};
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "telemetry-pipeline", version, about = "Collect and classify hardware telemetry")]
struct Cli {
    /// Path to the JSON configuration file
    config: PathBuf,

    /// Stop polling after this many seconds
    #[arg(long, value_name = "N")]
    duration_secs: Option<u64>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(&cli) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    info!(version = env!("CARGO_PKG_VERSION"), "telemetry pipeline starting");

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "pipeline failed");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = AppConfig::from_file(&cli.config)?;
    let mut app = TelemetryApp::new(config)?;

    if app.open_sources() == 0 {
        app.shutdown();
        return Err(PipelineError::other("no telemetry source could be opened"));
    }

    let stop = Arc::new(AtomicBool::new(false));
    shutdown::stop_on_signal(Arc::clone(&stop))?;
    if let Some(secs) = cli.duration_secs {
        let stop = Arc::clone(&stop);
        thread::Builder::new()
            .name("duration-timer".to_string())
            .spawn(move || {
                thread::sleep(Duration::from_secs(secs));
                stop.store(true, Ordering::Relaxed);
            })
            .map_err(|e| PipelineError::io_operation("spawning timer", "duration-timer", e))?;
    }

    let summary = app.run(&stop);
    app.shutdown();

    let metrics = app.dispatcher().metrics();
    info!(
        readings = summary.readings,
        accepted = metrics.entries_accepted(),
        rejected = metrics.entries_rejected(),
        failed_writes = metrics.writes_failed(),
        "telemetry pipeline stopped"
    );
    Ok(())
}

/// Initialize logging based on CLI options
fn init_logging(cli: &Cli) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else {
        let default_level = match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    };

    // Diagnostics go to stderr so they never mix with console sink output
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| PipelineError::other(format!("Failed to initialize logging: {}", e)))
}
