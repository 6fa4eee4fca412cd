//! Basic logger usage example
//!
//! Demonstrates synchronous logging to the console, level filtering,
//! patterns and the registry.
//!
//! Run with: cargo run --example basic_usage

use rust_log_relay::prelude::*;
use rust_log_relay::{info, warn};

fn main() -> Result<()> {
    println!("=== Rust Log Relay - Basic Usage Example ===\n");

    // Create a synchronous console logger with colored level names
    let logger = Logger::builder("basic")
        .min_level(LogLevel::Trace)
        .sink(ConsoleSink::with_colors(true))
        .build()?;

    // Log messages at different levels
    println!("1. Logging at different levels:");
    logger.trace("This is a trace message")?;
    logger.debug("This is a debug message")?;
    logger.info("This is an info message")?;
    logger.warn("This is a warning message")?;
    logger.error("This is an error message")?;
    logger.fatal("This is a fatal message")?;

    println!("\n2. Logging with different minimum levels:");
    logger.set_min_level(LogLevel::Info);
    println!("   Minimum level set to INFO - trace and debug won't show:");
    logger.trace("Trace message (hidden)")?;
    logger.debug("Debug message (hidden)")?;
    logger.info("Info message (visible)")?;

    println!("\n3. Macros with format arguments:");
    let port = 8080;
    info!(logger, "Server listening on port {}", port)?;
    warn!(logger, "Retry attempt {} of {}", 3, 5)?;

    println!("\n4. Custom pattern:");
    let compact = Logger::builder("compact")
        .pattern("%d{%H:%M:%S} %p %c: %m%n")
        .build()?;
    compact.info("Pattern tokens are checked when the logger is built")?;

    match Logger::builder("broken").pattern("%m%q").build() {
        Ok(_) => println!("   unexpected: bad pattern accepted"),
        Err(e) => println!("   rejected: {}", e),
    }

    println!("\n5. Registry lookup:");
    let registry = LoggerRegistry::new()?;
    registry.register(compact);
    if let Some(found) = registry.get("compact") {
        found.info("Found through the registry")?;
    }
    registry.default_logger().info("Default logger is always present")?;

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
