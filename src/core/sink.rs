//! Sink trait for log output destinations

use super::{error::Result, record::LogRecord};
use parking_lot::Mutex;
use std::sync::Arc;

/// A destination for rendered log output
///
/// Every sink takes raw rendered bytes through [`log`](Sink::log). Sinks that
/// can use the structured record (databases, network shippers) override
/// [`log_record`](Sink::log_record); all others inherit the default, which
/// forwards the rendered text.
///
/// # Example
///
/// ```
/// use rust_log_relay::{Result, Sink};
///
/// struct CountingSink(usize);
///
/// impl Sink for CountingSink {
///     fn log(&mut self, data: &[u8]) -> Result<()> {
///         self.0 += data.len();
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "counting"
///     }
/// }
/// ```
pub trait Sink: Send {
    /// Write already rendered text, possibly several records at once
    fn log(&mut self, data: &[u8]) -> Result<()>;

    /// Write one record; `rendered` is its rendering by the owning logger
    fn log_record(&mut self, _record: &LogRecord, rendered: &[u8]) -> Result<()> {
        self.log(rendered)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}

impl Sink for Box<dyn Sink> {
    fn log(&mut self, data: &[u8]) -> Result<()> {
        (**self).log(data)
    }

    fn log_record(&mut self, record: &LogRecord, rendered: &[u8]) -> Result<()> {
        (**self).log_record(record, rendered)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// A sink shared between several loggers; each call locks it.
impl<S: Sink> Sink for Arc<Mutex<S>> {
    fn log(&mut self, data: &[u8]) -> Result<()> {
        self.lock().log(data)
    }

    fn log_record(&mut self, record: &LogRecord, rendered: &[u8]) -> Result<()> {
        self.lock().log_record(record, rendered)
    }

    fn flush(&mut self) -> Result<()> {
        self.lock().flush()
    }

    fn name(&self) -> &str {
        "shared"
    }
}

/// Collects everything written into a shared buffer
///
/// Mostly useful in tests and for capturing a logger's output in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    buffer: Arc<Mutex<Vec<u8>>>,
    flushes: Arc<Mutex<usize>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    pub fn flush_count(&self) -> usize {
        *self.flushes.lock()
    }
}

impl Sink for MemorySink {
    fn log(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.lock().extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        *self.flushes.lock() += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
