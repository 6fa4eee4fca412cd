//! Async logging example
//!
//! Demonstrates the async pipeline with several producer threads.
//!
//! Run with: cargo run --example async_logging

use rust_log_relay::prelude::*;
use std::sync::Arc;
use std::thread;

fn main() -> Result<()> {
    println!("=== Rust Log Relay - Async Logging Example ===\n");

    // Safe mode: producers wait instead of growing the buffer without bound
    let logger = Arc::new(
        Logger::builder("async")
            .pattern("[%d{%H:%M:%S}][%t][%p]%T%m%n")
            .sink(FileSink::new("async_test.log")?)
            .async_mode(BackpressureMode::Safe)
            .buffer_capacity(64 * 1024)
            .build()?,
    );

    println!("1. High-performance async logging:");
    for i in 0..100 {
        logger.info(format!("Message #{}", i))?;
    }
    println!("   Logged 100 messages asynchronously");

    println!("\n2. Multi-threaded logging:");
    let mut handles = vec![];
    for thread_id in 0..5 {
        let logger = Arc::clone(&logger);
        handles.push(thread::spawn(move || -> Result<()> {
            for i in 0..20 {
                logger.info(format!("Thread {} - Message {}", thread_id, i))?;
            }
            Ok(())
        }));
    }
    for handle in handles {
        handle.join().expect("producer thread panicked")?;
    }
    println!("   5 threads logged 20 messages each");

    // Drain the pipeline before reading metrics
    logger.shutdown()?;

    let metrics = logger.metrics();
    println!("\n3. Pipeline metrics:");
    println!("   records logged:   {}", metrics.total_logged());
    println!("   flush epochs:     {}", metrics.flush_epochs());
    println!("   avg epoch bytes:  {:.1}", metrics.average_batch_bytes());
    println!("   producer waits:   {}", metrics.backpressure_waits());

    println!("\n=== Example completed successfully! ===");
    println!("Check 'async_test.log' for file output");

    Ok(())
}
