//! Integration tests for the logging framework and the collector
//!
//! These tests verify:
//! - Async logging from several threads loses and tears nothing
//! - Records shipped over TCP survive arbitrary write fragmentation
//! - TCP and UDP sinks round-trip through the collectors, sync and async
//! - Sink failures surface from the logger and stop the collectors
//! - Registry, config and database sink behave end to end

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_log_relay::net::{encode_frame, Payload, TcpLogServer, UdpLogServer};
use rust_log_relay::core::ServerMetrics;
use rust_log_relay::prelude::*;
use rust_log_relay::sinks::{TcpSink, UdpSink};
use std::fs;
use std::io::Write;
use std::net::TcpStream;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("Failed to read log file")
        .lines()
        .map(str::to_string)
        .collect()
}

fn wait_for_lines(memory: &MemorySink, count: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while memory.lines().len() < count && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
}

fn wait_for_frames(metrics: &ServerMetrics, count: u64) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while metrics.frames_decoded() < count && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
}

/// Fails every write, like a full disk
struct FailingSink;

impl Sink for FailingSink {
    fn log(&mut self, _data: &[u8]) -> Result<()> {
        Err(LoggerError::io_operation(
            "writing log file",
            "full.log",
            std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        ))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// `yy-mm-dd|HH:MM:SS`
fn is_timestamp(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 17
        && bytes.iter().enumerate().all(|(i, b)| match i {
            2 | 5 => *b == b'-',
            8 => *b == b'|',
            11 | 14 => *b == b':',
            _ => b.is_ascii_digit(),
        })
}

#[test]
fn test_concurrent_async_logging_keeps_every_line() {
    const TOTAL: usize = 50_000;
    const THREADS: usize = 3;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("svc.log");

    let logger = Arc::new(
        Logger::builder("svc")
            .pattern("[%d{%y-%m-%d|%H:%M:%S}][%t][%c][%p]%T%m%n")
            .sink(FileSink::new(&log_file).expect("Failed to create sink"))
            .async_mode(BackpressureMode::Safe)
            .buffer_capacity(64 * 1024)
            .build()
            .expect("Failed to build logger"),
    );

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            let count = TOTAL / THREADS + usize::from(t < TOTAL % THREADS);
            thread::spawn(move || {
                for i in 0..count {
                    logger.fatal(format!("worker-{}-{}", t, i)).unwrap();
                }
                count
            })
        })
        .collect();

    let logged: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert_eq!(logged, TOTAL);
    logger.shutdown().expect("Failed to shut down");

    let lines = read_lines(&log_file);
    assert_eq!(lines.len(), TOTAL);

    let mut seen = std::collections::HashSet::new();
    for line in &lines {
        assert!(line.starts_with('['), "torn line: {:?}", line);
        assert!(is_timestamp(&line[1..18]), "bad timestamp: {:?}", line);
        assert!(line.contains("][svc][FATAL]\tworker-"), "bad layout: {:?}", line);
        let message = line.rsplit('\t').next().unwrap();
        assert!(seen.insert(message.to_string()), "duplicate line: {:?}", line);
    }

    // Each producer's records stay in its own order
    for t in 0..THREADS {
        let prefix = format!("worker-{}-", t);
        let indices: Vec<usize> = lines
            .iter()
            .filter_map(|line| line.rsplit('\t').next())
            .filter_map(|m| m.strip_prefix(&prefix))
            .map(|i| i.parse().unwrap())
            .collect();
        assert!(indices.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn test_fragmented_tcp_stream_is_reassembled() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("collected.log");

    let collector = Arc::new(
        Logger::builder("collector")
            .pattern("%c|%p|%m%n")
            .sink(FileSink::new(&log_file).unwrap())
            .build()
            .unwrap(),
    );
    let handle = TcpLogServer::bind("127.0.0.1:0", Arc::clone(&collector), 2)
        .unwrap()
        .spawn()
        .unwrap();

    let mut bytes = Vec::new();
    for i in 0..100 {
        let record = LogRecord::new(LogLevel::Info, "client.rs", i, "client", format!("record-{}", i));
        bytes.extend(encode_frame(&Payload::from_record(&record)).unwrap());
    }

    let mut rng = StdRng::seed_from_u64(7);
    let mut stream = TcpStream::connect(handle.local_addr()).unwrap();
    stream.set_nodelay(true).unwrap();
    let mut offset = 0;
    while offset < bytes.len() {
        let end = (offset + rng.gen_range(1..=37)).min(bytes.len());
        stream.write_all(&bytes[offset..end]).unwrap();
        offset = end;
    }
    drop(stream);

    let deadline = Instant::now() + Duration::from_secs(5);
    while handle.metrics().frames_decoded() < 100 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    handle.shutdown().unwrap();
    collector.flush().unwrap();

    let expected: Vec<String> = (0..100).map(|i| format!("client|INFO|record-{}", i)).collect();
    assert_eq!(read_lines(&log_file), expected);
}

#[test]
fn test_two_frames_then_close() {
    let memory = MemorySink::new();
    let collector = Arc::new(
        Logger::builder("collector")
            .pattern("%m%n")
            .sink(memory.clone())
            .build()
            .unwrap(),
    );
    let handle = TcpLogServer::bind("127.0.0.1:0", collector, 1)
        .unwrap()
        .spawn()
        .unwrap();

    let mut stream = TcpStream::connect(handle.local_addr()).unwrap();
    stream.write_all(&encode_frame(&Payload::text("first\n")).unwrap()).unwrap();
    stream.write_all(&encode_frame(&Payload::text("second\n")).unwrap()).unwrap();
    drop(stream);

    wait_for_lines(&memory, 2);
    assert_eq!(memory.lines(), vec!["first", "second"]);
    assert_eq!(handle.metrics().connections_accepted(), 1);
    handle.shutdown().unwrap();
}

#[test]
fn test_tcp_sink_ships_to_collector() {
    let memory = MemorySink::new();
    let collector = Arc::new(
        Logger::builder("collector")
            .pattern("[%c][%p] %m%n")
            .sink(memory.clone())
            .build()
            .unwrap(),
    );
    // One worker serves the short-lived connections in accept order
    let handle = TcpLogServer::bind("127.0.0.1:0", collector, 1)
        .unwrap()
        .spawn()
        .unwrap();

    let client = Logger::builder("client")
        .sink(TcpSink::new(handle.local_addr()).unwrap())
        .build()
        .unwrap();
    client.info("hello").unwrap();
    client.error("disk full").unwrap();

    wait_for_lines(&memory, 2);
    assert_eq!(memory.lines(), vec!["[client][INFO] hello", "[client][ERROR] disk full"]);
    assert_eq!(handle.metrics().connections_accepted(), 2);
    handle.shutdown().unwrap();
}

#[test]
fn test_persistent_tcp_sink_uses_one_connection() {
    let memory = MemorySink::new();
    let collector = Arc::new(
        Logger::builder("collector")
            .pattern("%m%n")
            .sink(memory.clone())
            .build()
            .unwrap(),
    );
    let handle = TcpLogServer::bind("127.0.0.1:0", collector, 1)
        .unwrap()
        .spawn()
        .unwrap();

    let client = Logger::builder("client")
        .sink(TcpSink::new(handle.local_addr()).unwrap().persistent(true))
        .build()
        .unwrap();
    for i in 0..10 {
        client.info(format!("m{}", i)).unwrap();
    }
    drop(client);

    wait_for_lines(&memory, 10);
    assert_eq!(memory.lines().len(), 10);
    assert_eq!(handle.metrics().connections_accepted(), 1);
    handle.shutdown().unwrap();
}

#[test]
fn test_udp_sink_round_trip() {
    let memory = MemorySink::new();
    let collector = Arc::new(
        Logger::builder("collector")
            .pattern("[%c][%p] %m%n")
            .sink(memory.clone())
            .build()
            .unwrap(),
    );
    let handle = UdpLogServer::bind("127.0.0.1:0", collector)
        .unwrap()
        .spawn()
        .unwrap();

    let client = Logger::builder("edge")
        .sink(UdpSink::new(handle.local_addr()).unwrap())
        .build()
        .unwrap();
    client.warn("over loopback").unwrap();

    wait_for_lines(&memory, 1);
    assert_eq!(memory.lines(), vec!["[edge][WARN] over loopback"]);
    assert_eq!(handle.metrics().frames_decoded(), 1);
    handle.shutdown().unwrap();
}

#[test]
fn test_async_logger_ships_each_line_over_udp() {
    const RECORDS: usize = 50;

    let memory = MemorySink::new();
    let collector = Arc::new(
        Logger::builder("collector")
            .pattern("%m%n")
            .sink(memory.clone())
            .build()
            .unwrap(),
    );
    let handle = UdpLogServer::bind("127.0.0.1:0", collector)
        .unwrap()
        .spawn()
        .unwrap();

    // Large buffers so many records share one epoch
    let client = Logger::builder("edge")
        .pattern("[%c][%p] %m%n")
        .sink(UdpSink::new(handle.local_addr()).unwrap())
        .async_mode(BackpressureMode::Safe)
        .buffer_capacity(64 * 1024)
        .build()
        .unwrap();
    for i in 0..RECORDS {
        client.info(format!("event-{:03} {}", i, "x".repeat(80))).unwrap();
    }
    client.shutdown().unwrap();

    wait_for_lines(&memory, RECORDS);
    let expected: Vec<String> = (0..RECORDS)
        .map(|i| format!("[edge][INFO] event-{:03} {}", i, "x".repeat(80)))
        .collect();
    assert_eq!(memory.lines(), expected);
    assert_eq!(handle.metrics().frames_decoded(), RECORDS as u64);
    handle.shutdown().unwrap();
}

#[test]
fn test_async_logger_ships_each_line_over_tcp() {
    const RECORDS: usize = 500;

    let memory = MemorySink::new();
    let collector = Arc::new(
        Logger::builder("collector")
            .pattern("%m%n")
            .sink(memory.clone())
            .build()
            .unwrap(),
    );
    // One worker keeps the per-epoch connections in accept order
    let handle = TcpLogServer::bind("127.0.0.1:0", collector, 1)
        .unwrap()
        .spawn()
        .unwrap();

    let client = Logger::builder("client")
        .pattern("%p %m%n")
        .sink(TcpSink::new(handle.local_addr()).unwrap())
        .async_mode(BackpressureMode::Safe)
        .buffer_capacity(4 * 1024)
        .build()
        .unwrap();
    for i in 0..RECORDS {
        client.warn(format!("batch-{}", i)).unwrap();
    }
    client.shutdown().unwrap();

    wait_for_lines(&memory, RECORDS);
    let expected: Vec<String> = (0..RECORDS).map(|i| format!("WARN batch-{}", i)).collect();
    assert_eq!(memory.lines(), expected);
    assert_eq!(handle.metrics().frames_decoded(), RECORDS as u64);
    assert_eq!(handle.metrics().protocol_errors(), 0);
    handle.shutdown().unwrap();
}

#[test]
fn test_failing_sink_aborts_fan_out() {
    let first = MemorySink::new();
    let third = MemorySink::new();
    let logger = Logger::builder("app")
        .pattern("%m%n")
        .sink(first.clone())
        .sink(FailingSink)
        .sink(third.clone())
        .build()
        .unwrap();

    let result = logger.info("written once");
    assert!(matches!(result, Err(LoggerError::IoOperation { .. })));
    assert_eq!(first.lines(), vec!["written once"]);
    assert!(third.contents().is_empty());
}

#[test]
fn test_udp_collector_stops_on_sink_failure() {
    let collector = Arc::new(Logger::builder("collector").sink(FailingSink).build().unwrap());
    let handle = UdpLogServer::bind("127.0.0.1:0", collector)
        .unwrap()
        .spawn()
        .unwrap();

    let client = Logger::builder("edge")
        .sink(UdpSink::new(handle.local_addr()).unwrap())
        .build()
        .unwrap();
    client.error("nowhere to go").unwrap();

    wait_for_frames(handle.metrics(), 1);
    assert!(matches!(handle.shutdown(), Err(LoggerError::IoOperation { .. })));
}

#[test]
fn test_tcp_collector_stops_on_sink_failure() {
    let collector = Arc::new(Logger::builder("collector").sink(FailingSink).build().unwrap());
    let handle = TcpLogServer::bind("127.0.0.1:0", collector, 2)
        .unwrap()
        .spawn()
        .unwrap();

    let client = Logger::builder("client")
        .sink(TcpSink::new(handle.local_addr()).unwrap())
        .build()
        .unwrap();
    client.error("nowhere to go").unwrap();

    wait_for_frames(handle.metrics(), 1);
    assert!(matches!(handle.shutdown(), Err(LoggerError::IoOperation { .. })));
}

#[test]
fn test_log_injection_is_escaped() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("injection_test.log");

    let logger = Logger::builder("app")
        .pattern("%p %m%n")
        .sink(FileSink::new(&log_file).unwrap())
        .build()
        .unwrap();
    logger.info("User login\nERROR fake entry\tinjected").unwrap();
    logger.flush().unwrap();

    let lines = read_lines(&log_file);
    assert_eq!(lines, vec!["INFO User login\\nERROR fake entry\\tinjected"]);
}

#[test]
fn test_bad_pattern_fails_build() {
    let result = Logger::builder("app").pattern("[%p] %m%q").build();
    assert!(matches!(result, Err(LoggerError::Pattern { .. })));

    let result = Logger::builder("app").pattern("%d{%H:%M").build();
    assert!(matches!(result, Err(LoggerError::Pattern { .. })));
}

#[test]
fn test_registry_first_registration_wins() {
    let registry = LoggerRegistry::new().unwrap();
    let first_memory = MemorySink::new();
    let second_memory = MemorySink::new();

    let first = registry.register(
        Logger::builder("svc").pattern("%m%n").sink(first_memory.clone()).build().unwrap(),
    );
    let second = registry.register(
        Logger::builder("svc").pattern("%m%n").sink(second_memory.clone()).build().unwrap(),
    );
    assert!(Arc::ptr_eq(&first, &second));

    registry.get("svc").unwrap().info("routed").unwrap();
    assert_eq!(first_memory.lines(), vec!["routed"]);
    assert!(second_memory.contents().is_empty());
    assert_eq!(registry.names(), vec!["root".to_string(), "svc".to_string()]);
}

#[test]
fn test_config_builds_collector_logger() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("server.log");
    let config_file = temp_dir.path().join("relay.toml");
    fs::write(
        &config_file,
        format!(
            "[Server]\nport = 0\npattern = \"[%p] %m%n\"\nlevel = \"INFO\"\n\n[FileSink]\npath = {:?}\n",
            log_file.display().to_string()
        ),
    )
    .unwrap();

    let config = Config::load(&config_file).unwrap();
    assert_eq!(config.server().workers, 4);

    let logger = config.build_logger("collector").unwrap();
    assert_eq!(logger.sink_count(), 1);
    logger.debug("filtered").unwrap();
    logger.info("kept").unwrap();
    logger.shutdown().unwrap();

    assert_eq!(read_lines(&log_file), vec!["[INFO] kept"]);
}

#[cfg(feature = "database")]
#[test]
fn test_database_sink_one_row_per_record() {
    use parking_lot::Mutex;
    use rust_log_relay::sinks::DatabaseSink;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let database = Arc::new(Mutex::new(
        DatabaseSink::new(temp_dir.path().join("log.db")).unwrap(),
    ));

    let logger = Logger::builder("db")
        .sink(Arc::clone(&database))
        .build()
        .unwrap();
    logger.info("first").unwrap();
    logger.warn("second").unwrap();
    logger.error("third").unwrap();

    let database = database.lock();
    assert_eq!(database.count_rows().unwrap(), 3);
    assert_eq!(
        database.entries().unwrap(),
        vec![
            ("INFO".to_string(), "first".to_string()),
            ("WARN".to_string(), "second".to_string()),
            ("ERROR".to_string(), "third".to_string()),
        ]
    );
}
