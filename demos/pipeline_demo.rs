//! Pooled pipeline example
//!
//! Formats a handful of simulated CPU, GPU and RAM readings and delivers them
//! to the console and to a JSON-lines file through a pooled dispatcher.
//!
//! Run with: cargo run --example pipeline_demo

use std::sync::Arc;
use telemetry_pipeline::prelude::*;

fn main() -> Result<()> {
    println!("=== Telemetry Pipeline - Pooled Dispatch Example ===\n");

    let log_path = std::env::temp_dir().join("telemetry_pipeline_demo.jsonl");
    let file_sink = Arc::new(FileSink::new(&log_path)?.with_output_format(OutputFormat::Json));

    let dispatcher = Dispatcher::builder()
        .queue_capacity(8)
        .workers(2)
        .sink(ConsoleSink::new())
        .shared_sink(file_sink)
        .build()?;

    let readings = [
        (TelemetryType::Cpu, ["12.0", "76.3", "91.8"]),
        (TelemetryType::Gpu, ["80", "80.5", "97.1"]),
        (TelemetryType::Ram, ["65.2", "not-a-number", "88"]),
    ];

    for (telemetry_type, raws) in readings {
        let formatter = LogFormatter::new("DemoApp", telemetry_type.default_policy());
        for raw in raws {
            match formatter.format(raw) {
                Ok(entry) => dispatcher.log(entry)?,
                Err(e) => println!("   skipped: {}", e),
            }
        }
    }

    dispatcher.shutdown();

    let metrics = dispatcher.metrics();
    println!("\nAccepted entries: {}", metrics.entries_accepted());
    println!("Successful writes: {}", metrics.writes_succeeded());
    println!("JSON output written to {}", log_path.display());

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
