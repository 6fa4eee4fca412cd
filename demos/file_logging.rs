//! File logging example
//!
//! Demonstrates a plain file sink next to the two rolling sinks.
//!
//! Run with: cargo run --example file_logging

use rust_log_relay::prelude::*;

fn main() -> Result<()> {
    println!("=== Rust Log Relay - File Logging Example ===\n");

    // Console and file at the same time
    let logger = Logger::builder("app")
        .min_level(LogLevel::Debug)
        .sink(ConsoleSink::new())
        .sink(FileSink::new("./log/application.log")?)
        .build()?;

    println!("1. Logging to both console and file:");
    logger.info("Application started")?;
    logger.debug("Loading configuration...")?;
    logger.info("Configuration loaded successfully")?;
    logger.warn("Using default settings for some options")?;
    logger.error("Failed to load optional plugin")?;

    println!("\n2. Rolling by size:");
    // Starts a new file once the current one reaches 1 KiB
    let rolling = Logger::builder("rolling")
        .pattern("[%d{%H:%M:%S}][%p] %m%n")
        .sink(RollBySizeSink::new("./log/roll-", 1024)?)
        .build()?;
    for i in 1..=100 {
        rolling.info(format!("Processing item {}/100", i))?;
    }
    println!("   100 records written under ./log/roll-*.log");

    println!("\n3. Rolling by time:");
    let hourly = Logger::builder("hourly")
        .sink(RollByTimeSink::new("./log/hourly-", "GAP_HOUR".parse::<TimeGap>()?)?)
        .build()?;
    hourly.info("One file per wall-clock hour")?;

    logger.flush()?;
    rolling.flush()?;
    hourly.flush()?;

    println!("\n=== Example completed successfully! ===");
    println!("Check './log/' for the full log output");

    Ok(())
}
