//! Main logger implementation

use super::{
    buffer::DEFAULT_BUFFER_SIZE,
    error::{LoggerError, Result},
    formatter::{Formatter, DEFAULT_PATTERN},
    log_level::LogLevel,
    metrics::LoggerMetrics,
    pipeline::{AsyncPipeline, BackpressureMode},
    record::LogRecord,
    sink::Sink,
};
use crate::sinks::ConsoleSink;
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type SinkSet = Arc<Mutex<Vec<Box<dyn Sink>>>>;

/// A named logger with a level threshold, a pattern and a set of sinks
///
/// In synchronous mode every call renders the record and fans it out to the
/// sinks on the calling thread. In asynchronous mode the rendered bytes are
/// pushed into an [`AsyncPipeline`] whose consumer thread writes whole epochs
/// to the sinks and flushes them.
///
/// # Example
///
/// ```
/// use rust_log_relay::prelude::*;
///
/// let logger = Logger::builder("app")
///     .min_level(LogLevel::Info)
///     .pattern("[%p][%c] %m%n")
///     .sink(MemorySink::new())
///     .build()
///     .unwrap();
///
/// logger.info("started").unwrap();
/// logger.debug("filtered out").unwrap();
/// assert_eq!(logger.metrics().total_logged(), 1);
/// ```
pub struct Logger {
    name: String,
    formatter: Formatter,
    min_level: RwLock<LogLevel>,
    sinks: SinkSet,
    pipeline: Option<AsyncPipeline>,
    metrics: Arc<LoggerMetrics>,
    stopped: AtomicBool,
}

impl Logger {
    /// Start building a logger named `name`
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        self.formatter.pattern()
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    pub fn min_level(&self) -> LogLevel {
        *self.min_level.read()
    }

    pub fn set_min_level(&self, level: LogLevel) {
        *self.min_level.write() = level;
    }

    pub fn is_async(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Get a reference to the logger metrics
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.lock().len()
    }

    /// Append a sink; it receives every record dispatched afterwards
    pub fn add_sink<S: Sink + 'static>(&self, sink: S) {
        self.sinks.lock().push(Box::new(sink));
    }

    /// Whether a record at `level` would pass the threshold
    pub fn enabled(&self, level: LogLevel) -> bool {
        level != LogLevel::Off && level >= self.min_level()
    }

    fn ensure_running(&self) -> Result<()> {
        if self.stopped.load(Ordering::Acquire) {
            Err(LoggerError::LoggerStopped)
        } else {
            Ok(())
        }
    }

    /// Log formatted arguments with an explicit source location.
    ///
    /// Below the threshold nothing is formatted. This is what the logging
    /// macros expand to.
    pub fn log_at(&self, level: LogLevel, file: &str, line: u32, args: fmt::Arguments<'_>) -> Result<()> {
        if !self.enabled(level) {
            self.metrics.record_filtered();
            return Ok(());
        }
        let record = match args.as_str() {
            Some(message) => LogRecord::new(level, file, line, &self.name, message),
            None => LogRecord::new(level, file, line, &self.name, args.to_string()),
        };
        self.dispatch(&record)
    }

    /// Log a pre-rendered message at the caller's location
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) -> Result<()> {
        let location = Location::caller();
        if !self.enabled(level) {
            self.metrics.record_filtered();
            return Ok(());
        }
        let record = LogRecord::new(level, location.file(), location.line(), &self.name, message);
        self.dispatch(&record)
    }

    #[track_caller]
    pub fn trace(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Trace, message)
    }

    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Debug, message)
    }

    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Info, message)
    }

    #[track_caller]
    pub fn warn(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Warn, message)
    }

    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Error, message)
    }

    #[track_caller]
    pub fn fatal(&self, message: impl AsRef<str>) -> Result<()> {
        self.log(LogLevel::Fatal, message)
    }

    /// Re-render and dispatch a record captured elsewhere, such as one
    /// received by the collector. The threshold still applies.
    pub fn log_record(&self, record: &LogRecord) -> Result<()> {
        if !self.enabled(record.level()) {
            self.metrics.record_filtered();
            return Ok(());
        }
        self.dispatch(record)
    }

    /// Dispatch text that is already in its final form
    pub fn log_rendered(&self, text: &[u8]) -> Result<()> {
        self.ensure_running()?;
        self.metrics.record_logged();
        match &self.pipeline {
            Some(pipeline) => pipeline.push(text),
            None => {
                let mut sinks = self.sinks.lock();
                for sink in sinks.iter_mut() {
                    sink.log(text)?;
                }
                Ok(())
            }
        }
    }

    fn dispatch(&self, record: &LogRecord) -> Result<()> {
        self.ensure_running()?;
        let rendered = self.formatter.render(record);
        self.metrics.record_logged();
        match &self.pipeline {
            Some(pipeline) => pipeline.push(rendered.as_bytes()),
            None => {
                let mut sinks = self.sinks.lock();
                for sink in sinks.iter_mut() {
                    sink.log_record(record, rendered.as_bytes())?;
                }
                Ok(())
            }
        }
    }

    /// Flush every sink.
    ///
    /// In async mode records still queued in the pipeline are not waited
    /// for; [`shutdown`](Self::shutdown) drains them.
    pub fn flush(&self) -> Result<()> {
        let mut sinks = self.sinks.lock();
        for sink in sinks.iter_mut() {
            sink.flush()?;
        }
        Ok(())
    }

    /// Stop accepting records, drain the pipeline and flush every sink.
    ///
    /// Idempotent. Later logging calls return [`LoggerError::LoggerStopped`].
    pub fn shutdown(&self) -> Result<()> {
        self.stopped.store(true, Ordering::Release);
        if let Some(pipeline) = &self.pipeline {
            pipeline.shutdown()?;
        }
        self.flush()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("pattern", &self.pattern())
            .field("min_level", &self.min_level())
            .field("async", &self.is_async())
            .finish()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            eprintln!("[LOGGER ERROR] Logger '{}' failed during shutdown: {}", self.name, e);
        }
    }
}

/// Builder for constructing a [`Logger`] with a fluent API
///
/// # Example
///
/// ```
/// use rust_log_relay::prelude::*;
///
/// let logger = Logger::builder("svc")
///     .min_level(LogLevel::Warn)
///     .sink(ConsoleSink::new())
///     .async_mode(BackpressureMode::Safe)
///     .buffer_capacity(64 * 1024)
///     .build()
///     .unwrap();
/// assert!(logger.is_async());
/// ```
pub struct LoggerBuilder {
    name: String,
    min_level: LogLevel,
    pattern: String,
    sinks: Vec<Box<dyn Sink>>,
    async_mode: Option<BackpressureMode>,
    buffer_capacity: usize,
}

impl LoggerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_level: LogLevel::Debug,
            pattern: DEFAULT_PATTERN.to_string(),
            sinks: Vec::new(),
            async_mode: None,
            buffer_capacity: DEFAULT_BUFFER_SIZE,
        }
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    /// Add a sink; sinks receive records in the order they were added
    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn boxed_sink(mut self, sink: Box<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Dispatch through an async pipeline with the given backpressure mode
    #[must_use = "builder methods return a new value"]
    pub fn async_mode(mut self, mode: BackpressureMode) -> Self {
        self.async_mode = Some(mode);
        self
    }

    /// Initial capacity of each pipeline buffer
    #[must_use = "builder methods return a new value"]
    pub fn buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Validate the configuration and build the logger.
    ///
    /// Fails on an empty name or a malformed pattern. A logger without
    /// sinks writes to the console.
    pub fn build(mut self) -> Result<Logger> {
        if self.name.trim().is_empty() {
            return Err(LoggerError::config("Logger", "name must not be empty"));
        }
        let formatter = Formatter::new(&self.pattern)?;
        if self.sinks.is_empty() {
            self.sinks.push(Box::new(ConsoleSink::new()));
        }

        let sinks: SinkSet = Arc::new(Mutex::new(self.sinks));
        let metrics = Arc::new(LoggerMetrics::new());

        let pipeline = match self.async_mode {
            Some(mode) => {
                let consumer_sinks = Arc::clone(&sinks);
                let flush = Box::new(move |epoch: &[u8]| -> Result<()> {
                    let mut sinks = consumer_sinks.lock();
                    for sink in sinks.iter_mut() {
                        sink.log(epoch)?;
                    }
                    for sink in sinks.iter_mut() {
                        sink.flush()?;
                    }
                    Ok(())
                });
                Some(AsyncPipeline::new(
                    &self.name,
                    mode,
                    self.buffer_capacity,
                    flush,
                    Arc::clone(&metrics),
                )?)
            }
            None => None,
        };

        Ok(Logger {
            name: self.name,
            formatter,
            min_level: RwLock::new(self.min_level),
            sinks,
            pipeline,
            metrics,
            stopped: AtomicBool::new(false),
        })
    }
}
