//! Double-buffered handoff between producer threads and one consumer thread
//!
//! Producers append rendered bytes to the producer [`ElasticBuffer`] under a
//! mutex. The consumer swaps the producer buffer with its own (an epoch), then
//! hands the whole epoch to the flush callback with the lock released.

use super::{
    buffer::ElasticBuffer,
    error::{LoggerError, Result},
    metrics::LoggerMetrics,
};
use parking_lot::{Condvar, Mutex};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

/// Receives one epoch of bytes on the consumer thread
pub type FlushCallback = Box<dyn FnMut(&[u8]) -> Result<()> + Send>;

/// What a producer does when the producer buffer is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackpressureMode {
    /// Wait until the consumer has drained an epoch
    #[default]
    Safe,
    /// Never wait; the producer buffer grows without bound
    Unsafe,
}

/// Lifecycle of an [`AsyncPipeline`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStatus {
    Running,
    /// Stop requested, consumer still draining
    Stopping,
    Stopped,
    /// The flush callback failed; holds the error text
    Failed(String),
}

struct PipelineState {
    producer: ElasticBuffer,
    status: PipelineStatus,
}

struct Shared {
    state: Mutex<PipelineState>,
    /// Signals the consumer that data arrived or stop was requested
    not_empty: Condvar,
    /// Signals waiting producers that an epoch was drained
    not_full: Condvar,
    mode: BackpressureMode,
    metrics: Arc<LoggerMetrics>,
}

/// Many-producer, single-consumer byte pipeline
///
/// # Example
///
/// ```
/// use rust_log_relay::core::{AsyncPipeline, BackpressureMode, LoggerMetrics};
/// use std::sync::Arc;
///
/// let pipeline = AsyncPipeline::new(
///     "demo",
///     BackpressureMode::Safe,
///     1024,
///     Box::new(|bytes: &[u8]| {
///         print!("{}", String::from_utf8_lossy(bytes));
///         Ok(())
///     }),
///     Arc::new(LoggerMetrics::new()),
/// )
/// .unwrap();
///
/// pipeline.push(b"hello\n").unwrap();
/// pipeline.shutdown().unwrap();
/// ```
pub struct AsyncPipeline {
    shared: Arc<Shared>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl AsyncPipeline {
    /// Start the consumer thread `log-pipeline-<name>`.
    ///
    /// Both buffers start at `capacity` bytes.
    pub fn new(
        name: &str,
        mode: BackpressureMode,
        capacity: usize,
        flush: FlushCallback,
        metrics: Arc<LoggerMetrics>,
    ) -> Result<Self> {
        let shared = Arc::new(Shared {
            state: Mutex::new(PipelineState {
                producer: ElasticBuffer::with_capacity(capacity),
                status: PipelineStatus::Running,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            mode,
            metrics,
        });

        let consumer_shared = Arc::clone(&shared);
        let consumer = ElasticBuffer::with_capacity(capacity);
        let handle = thread::Builder::new()
            .name(format!("log-pipeline-{}", name))
            .spawn(move || Self::run_consumer(consumer_shared, consumer, flush))
            .map_err(|e| LoggerError::io_operation("spawning pipeline consumer", name, e))?;

        Ok(Self {
            shared,
            worker: Mutex::new(Some(handle)),
        })
    }

    fn run_consumer(shared: Arc<Shared>, mut consumer: ElasticBuffer, mut flush: FlushCallback) {
        loop {
            {
                let mut state = shared.state.lock();
                while state.status == PipelineStatus::Running && state.producer.is_empty() {
                    shared.not_empty.wait(&mut state);
                }
                if state.producer.is_empty() {
                    state.status = PipelineStatus::Stopped;
                    shared.not_full.notify_all();
                    return;
                }
                state.producer.swap(&mut consumer);
            }

            let epoch = consumer.readable_span();
            let len = epoch.len();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| flush(epoch)))
                .unwrap_or_else(|_| Err(LoggerError::pipeline_failed("flush callback panicked")));

            if let Err(e) = outcome {
                eprintln!("[LOGGER ERROR] Async pipeline stopped after flush failure: {}", e);
                let mut state = shared.state.lock();
                state.status = PipelineStatus::Failed(e.to_string());
                shared.not_full.notify_all();
                return;
            }

            shared.metrics.record_flush(len);
            consumer.reset();
            if shared.mode == BackpressureMode::Safe {
                shared.not_full.notify_all();
            }
        }
    }

    fn ensure_running(status: &PipelineStatus) -> Result<()> {
        match status {
            PipelineStatus::Running => Ok(()),
            PipelineStatus::Stopping | PipelineStatus::Stopped => Err(LoggerError::LoggerStopped),
            PipelineStatus::Failed(message) => Err(LoggerError::pipeline_failed(message.clone())),
        }
    }

    /// Append `bytes` to the current epoch.
    ///
    /// In [`BackpressureMode::Safe`] this waits while the producer buffer
    /// holds data and lacks room for `bytes`. A push into an empty buffer is
    /// always admitted, growing it if needed.
    pub fn push(&self, bytes: &[u8]) -> Result<()> {
        let mut state = self.shared.state.lock();
        Self::ensure_running(&state.status)?;

        if self.shared.mode == BackpressureMode::Safe {
            let mut waited = false;
            while state.status == PipelineStatus::Running
                && !state.producer.is_empty()
                && state.producer.writable_len() < bytes.len()
            {
                if !waited {
                    self.shared.metrics.record_backpressure_wait();
                    waited = true;
                }
                self.shared.not_full.wait(&mut state);
            }
            Self::ensure_running(&state.status)?;
        }

        state.producer.append(bytes);
        self.shared.metrics.record_pushed(bytes.len());
        drop(state);
        self.shared.not_empty.notify_one();
        Ok(())
    }

    /// Drain everything pushed so far, then stop the consumer.
    ///
    /// Idempotent. Returns the flush failure if the consumer failed.
    pub fn shutdown(&self) -> Result<()> {
        {
            let mut state = self.shared.state.lock();
            if state.status == PipelineStatus::Running {
                state.status = PipelineStatus::Stopping;
            }
        }
        self.shared.not_empty.notify_all();
        self.shared.not_full.notify_all();

        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                return Err(LoggerError::pipeline_failed("consumer thread panicked"));
            }
        }

        match &self.shared.state.lock().status {
            PipelineStatus::Failed(message) => Err(LoggerError::pipeline_failed(message.clone())),
            _ => Ok(()),
        }
    }

    pub fn status(&self) -> PipelineStatus {
        self.shared.state.lock().status.clone()
    }

    pub fn mode(&self) -> BackpressureMode {
        self.shared.mode
    }

    /// Bytes pushed but not yet taken by the consumer
    pub fn pending_len(&self) -> usize {
        self.shared.state.lock().producer.readable_len()
    }
}

impl Drop for AsyncPipeline {
    fn drop(&mut self) {
        // A failure was already reported by the consumer thread
        let _ = self.shutdown();
    }
}
