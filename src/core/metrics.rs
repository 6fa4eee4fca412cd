//! Logger and collector metrics for observability
//!
//! Plain relaxed atomic counters. They are snapshots, not synchronization:
//! never use them to decide whether data has reached a sink.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by a [`Logger`](crate::Logger) and its async pipeline
///
/// # Example
///
/// ```
/// use rust_log_relay::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
/// metrics.record_logged();
/// metrics.record_filtered();
///
/// assert_eq!(metrics.total_logged(), 1);
/// assert_eq!(metrics.filtered_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Records that passed the level gate and were dispatched
    total_logged: AtomicU64,

    /// Records rejected by the level gate
    filtered_count: AtomicU64,

    /// Bytes handed to the async pipeline
    bytes_pushed: AtomicU64,

    /// Producer/consumer buffer swaps performed
    flush_epochs: AtomicU64,

    /// Bytes fanned out by the consumer thread
    bytes_flushed: AtomicU64,

    /// Times a producer had to wait for buffer space
    backpressure_waits: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            total_logged: AtomicU64::new(0),
            filtered_count: AtomicU64::new(0),
            bytes_pushed: AtomicU64::new(0),
            flush_epochs: AtomicU64::new(0),
            bytes_flushed: AtomicU64::new(0),
            backpressure_waits: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn bytes_pushed(&self) -> u64 {
        self.bytes_pushed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn flush_epochs(&self) -> u64 {
        self.flush_epochs.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn bytes_flushed(&self) -> u64 {
        self.bytes_flushed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn backpressure_waits(&self) -> u64 {
        self.backpressure_waits.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_pushed(&self, bytes: usize) -> u64 {
        self.bytes_pushed.fetch_add(bytes as u64, Ordering::Relaxed)
    }

    /// Record one consumer epoch that flushed `bytes`
    #[inline]
    pub fn record_flush(&self, bytes: usize) {
        self.flush_epochs.fetch_add(1, Ordering::Relaxed);
        self.bytes_flushed.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_backpressure_wait(&self) -> u64 {
        self.backpressure_waits.fetch_add(1, Ordering::Relaxed)
    }

    /// Average bytes per flush epoch, 0.0 before the first flush
    pub fn average_batch_bytes(&self) -> f64 {
        let epochs = self.flush_epochs();
        if epochs == 0 {
            0.0
        } else {
            self.bytes_flushed() as f64 / epochs as f64
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.total_logged.store(0, Ordering::Relaxed);
        self.filtered_count.store(0, Ordering::Relaxed);
        self.bytes_pushed.store(0, Ordering::Relaxed);
        self.flush_epochs.store(0, Ordering::Relaxed);
        self.bytes_flushed.store(0, Ordering::Relaxed);
        self.backpressure_waits.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            total_logged: AtomicU64::new(self.total_logged()),
            filtered_count: AtomicU64::new(self.filtered_count()),
            bytes_pushed: AtomicU64::new(self.bytes_pushed()),
            flush_epochs: AtomicU64::new(self.flush_epochs()),
            bytes_flushed: AtomicU64::new(self.bytes_flushed()),
            backpressure_waits: AtomicU64::new(self.backpressure_waits()),
        }
    }
}

/// Counters kept by the TCP and UDP collectors
#[derive(Debug, Default)]
pub struct ServerMetrics {
    connections_accepted: AtomicU64,
    frames_decoded: AtomicU64,
    bytes_received: AtomicU64,
    protocol_errors: AtomicU64,
}

impl ServerMetrics {
    pub const fn new() -> Self {
        Self {
            connections_accepted: AtomicU64::new(0),
            frames_decoded: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn connections_accepted(&self) -> u64 {
        self.connections_accepted.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn bytes_received(&self) -> u64 {
        self.bytes_received.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn protocol_errors(&self) -> u64 {
        self.protocol_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_connection(&self) -> u64 {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_frame(&self) -> u64 {
        self.frames_decoded.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_received(&self, bytes: usize) -> u64 {
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_protocol_error(&self) -> u64 {
        self.protocol_errors.fetch_add(1, Ordering::Relaxed)
    }
}
