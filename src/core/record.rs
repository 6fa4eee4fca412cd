//! Log record structure

use super::log_level::LogLevel;
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::cell::RefCell;

// Thread-local cache for the thread identity to avoid repeated allocations
thread_local! {
    static THREAD_ID_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Get cached thread ID, computing and caching it on first access
fn current_thread_id() -> String {
    THREAD_ID_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| format!("{:?}", std::thread::current().id()))
            .clone()
    })
}

/// One structured log event.
///
/// Created once per logging call and never mutated afterwards; fields are
/// read through accessors. Records rebuilt from the wire keep the shipped
/// text untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    timestamp: i64,
    level: LogLevel,
    file: String,
    line: u32,
    thread_id: String,
    logger: String,
    message: String,
}

impl LogRecord {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// so one record always renders to one line.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    /// Capture a record on the calling thread at the current time.
    pub fn new(
        level: LogLevel,
        file: &str,
        line: u32,
        logger: &str,
        message: impl AsRef<str>,
    ) -> Self {
        Self {
            timestamp: Utc::now().timestamp(),
            level,
            file: file.to_string(),
            line,
            thread_id: current_thread_id(),
            logger: logger.to_string(),
            message: Self::sanitize_message(message.as_ref()),
        }
    }

    /// Rebuild a record captured elsewhere, without sanitizing the message
    pub(crate) fn from_parts(
        timestamp: i64,
        level: LogLevel,
        file: String,
        line: u32,
        thread_id: String,
        logger: String,
        message: String,
    ) -> Self {
        Self {
            timestamp,
            level,
            file,
            line,
            thread_id,
            logger,
            message,
        }
    }

    /// Seconds since the Unix epoch
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn logger(&self) -> &str {
        &self.logger
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Record time in the local timezone.
    pub fn local_time(&self) -> DateTime<Local> {
        DateTime::<Utc>::from_timestamp(self.timestamp, 0)
            .unwrap_or_default()
            .with_timezone(&Local)
    }
}
