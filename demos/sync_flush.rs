//! Synchronous dispatch example
//!
//! Entries wait in the queue until `flush` writes them, in order, from the
//! calling thread. A full queue is flushed by the producer itself.
//!
//! Run with: cargo run --example sync_flush

use telemetry_pipeline::prelude::*;

fn main() -> Result<()> {
    println!("=== Telemetry Pipeline - Synchronous Flush Example ===\n");

    let dispatcher = Dispatcher::builder()
        .queue_capacity(4)
        .synchronous()
        .sink(ConsoleSink::with_colors(false))
        .build()?;

    let formatter = LogFormatter::new("SyncApp", ThresholdPolicy::cpu());

    println!("1. Queue three readings (nothing printed yet):");
    for raw in ["10", "75", "75.1"] {
        dispatcher.log(formatter.format(raw)?)?;
    }
    println!("   queued: {}", dispatcher.queue_len());

    println!("\n2. Flush writes them in order:");
    dispatcher.flush()?;

    println!("\n3. Overfill the queue; the producer flushes when it is full:");
    for i in 0..6 {
        dispatcher.log(formatter.format(&format!("{}", 85 + i))?)?;
    }
    println!("   still queued: {}", dispatcher.queue_len());

    println!("\n4. Shutdown delivers the rest:");
    dispatcher.shutdown();

    println!("\n=== Example completed successfully! ===");
    Ok(())
}
