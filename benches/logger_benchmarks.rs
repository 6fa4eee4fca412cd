//! Criterion benchmarks for rust_log_relay

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use rust_log_relay::net::{encode_frame, FrameDecoder, Payload};
use rust_log_relay::prelude::*;
use rust_log_relay::ElasticBuffer;

/// Discards everything so only the logger itself is measured
struct NullSink;

impl Sink for NullSink {
    fn log(&mut self, data: &[u8]) -> Result<()> {
        black_box(data);
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

// ============================================================================
// Logging Performance Benchmarks
// ============================================================================

fn bench_sync_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("sync_logging");
    group.throughput(Throughput::Elements(1));

    let logger = Logger::builder("bench")
        .min_level(LogLevel::Trace)
        .sink(NullSink)
        .build()
        .unwrap();

    group.bench_function("info", |b| {
        b.iter(|| logger.info(black_box("Info message")).unwrap());
    });

    group.bench_function("filtered", |b| {
        logger.set_min_level(LogLevel::Error);
        b.iter(|| logger.debug(black_box("Debug message")).unwrap());
        logger.set_min_level(LogLevel::Trace);
    });

    group.bench_function("formatted_macro", |b| {
        b.iter(|| rust_log_relay::info!(logger, "request {} took {}ms", black_box(42), 7).unwrap());
    });

    group.finish();
}

fn bench_async_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("async_logging");
    group.throughput(Throughput::Elements(1));

    for (label, mode) in [("safe", BackpressureMode::Safe), ("unsafe", BackpressureMode::Unsafe)] {
        let logger = Logger::builder("bench")
            .sink(NullSink)
            .async_mode(mode)
            .buffer_capacity(1024 * 1024)
            .build()
            .unwrap();

        group.bench_function(label, |b| {
            b.iter(|| logger.info(black_box("Async message")).unwrap());
        });

        logger.shutdown().unwrap();
    }

    group.finish();
}

// ============================================================================
// Formatting Benchmarks
// ============================================================================

fn bench_formatter(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatter");
    let record = LogRecord::new(LogLevel::Info, "src/server.rs", 120, "bench", "connection accepted");

    let default = Formatter::default();
    group.bench_function("default_pattern", |b| {
        b.iter(|| black_box(default.render(black_box(&record))));
    });

    let minimal = Formatter::new("%p %m%n").unwrap();
    group.bench_function("minimal_pattern", |b| {
        b.iter(|| black_box(minimal.render(black_box(&record))));
    });

    group.finish();
}

// ============================================================================
// Buffer and Codec Benchmarks
// ============================================================================

fn bench_buffer_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("elastic_buffer");
    let line = [b'x'; 128];
    group.throughput(Throughput::Bytes((line.len() * 1000) as u64));

    group.bench_function("append_1000_lines", |b| {
        b.iter_batched(
            || ElasticBuffer::with_capacity(4096),
            |mut buffer| {
                for _ in 0..1000 {
                    buffer.append(black_box(&line));
                }
                buffer
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let record = LogRecord::new(LogLevel::Warn, "src/client.rs", 88, "client", "cache miss ratio high");
    let payload = Payload::from_record(&record);
    let frame = encode_frame(&payload).unwrap();
    group.throughput(Throughput::Bytes(frame.len() as u64));

    group.bench_function("encode_frame", |b| {
        b.iter(|| black_box(encode_frame(black_box(&payload)).unwrap()));
    });

    group.bench_function("decode_frame", |b| {
        let mut decoder = FrameDecoder::new();
        b.iter(|| {
            decoder.extend(black_box(&frame));
            black_box(decoder.decode_next().unwrap())
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_sync_logging,
    bench_async_logging,
    bench_formatter,
    bench_buffer_append,
    bench_codec,
);
criterion_main!(benches);
