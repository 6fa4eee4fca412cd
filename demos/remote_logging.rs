//! Remote logging example
//!
//! Starts a TCP and a UDP collector in-process and ships records to them.
//!
//! Run with: cargo run --example remote_logging

use rust_log_relay::net::{TcpLogServer, UdpLogServer};
use rust_log_relay::prelude::*;
use rust_log_relay::sinks::{TcpSink, UdpSink};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn main() -> Result<()> {
    println!("=== Rust Log Relay - Remote Logging Example ===\n");

    // The collector re-renders every record with its own pattern
    let collector = Arc::new(
        Logger::builder("collector")
            .pattern("[collected][%d{%H:%M:%S}][%c][%p] %m%n")
            .sink(ConsoleSink::with_colors(true))
            .build()?,
    );

    let tcp = TcpLogServer::bind("127.0.0.1:0", Arc::clone(&collector), 2)?.spawn()?;
    let udp = UdpLogServer::bind("127.0.0.1:0", Arc::clone(&collector))?.spawn()?;
    println!("1. Collectors on tcp {} and udp {}", tcp.local_addr(), udp.local_addr());

    println!("\n2. Shipping structured records over TCP:");
    let client = Logger::builder("client")
        .sink(TcpSink::new(tcp.local_addr())?.persistent(true))
        .build()?;
    client.info("Connected to upstream")?;
    client.warn("Cache miss ratio above 30%")?;
    drop(client);

    println!("\n3. Shipping pre-rendered lines over UDP:");
    let udp_client = Logger::builder("udp-client")
        .pattern("[pre-rendered][%p] %m%n")
        .async_mode(BackpressureMode::Unsafe)
        .sink(UdpSink::new(udp.local_addr())?)
        .build()?;
    udp_client.error("Disk usage at 91%")?;
    udp_client.shutdown()?;

    // Give the collectors a moment to drain their sockets
    thread::sleep(Duration::from_millis(200));

    println!(
        "\n4. TCP collector decoded {} frames from {} connections",
        tcp.metrics().frames_decoded(),
        tcp.metrics().connections_accepted()
    );

    tcp.shutdown()?;
    udp.shutdown()?;

    println!("\n=== Example completed successfully! ===");

    Ok(())
}
