//! Rolling file sinks
//!
//! Two rollover rules are supported: by accumulated size and by wall-clock
//! bucket. Old files are never pruned or compressed.

use super::file::open_append;
use crate::core::{LoggerError, Result, Sink};
use chrono::{Local, Utc};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;

const FILE_TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Starts a new file once the current one holds at least `max_bytes`
///
/// Files are named `<base><YYYYmmddHHMMSS>-<counter>.log`, so `base` is a
/// path prefix such as `./log/roll-`.
pub struct RollBySizeSink {
    base: String,
    max_bytes: u64,
    counter: u64,
    written: u64,
    current_path: PathBuf,
    writer: BufWriter<File>,
}

impl RollBySizeSink {
    pub fn new(base: impl Into<String>, max_bytes: u64) -> Result<Self> {
        if max_bytes == 0 {
            return Err(LoggerError::config("RollBySize", "size must be greater than 0"));
        }
        let base = base.into();
        let current_path = Self::file_name(&base, 0);
        let writer = open_append(&current_path)?;
        Ok(Self {
            base,
            max_bytes,
            counter: 1,
            written: 0,
            current_path,
            writer,
        })
    }

    fn file_name(base: &str, counter: u64) -> PathBuf {
        PathBuf::from(format!(
            "{}{}-{}.log",
            base,
            Local::now().format(FILE_TIME_FORMAT),
            counter
        ))
    }

    fn roll(&mut self) -> Result<()> {
        self.writer.flush()?;
        let path = Self::file_name(&self.base, self.counter);
        self.counter += 1;
        self.writer = open_append(&path)?;
        self.current_path = path;
        self.written = 0;
        Ok(())
    }

    /// File currently being written
    pub fn current_path(&self) -> &PathBuf {
        &self.current_path
    }
}

impl Sink for RollBySizeSink {
    fn log(&mut self, data: &[u8]) -> Result<()> {
        if self.written >= self.max_bytes {
            self.roll()?;
        }
        self.writer.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "roll_by_size"
    }
}

impl Drop for RollBySizeSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

/// Rollover period of a [`RollByTimeSink`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeGap {
    Second,
    Minute,
    Hour,
    Day,
}

impl TimeGap {
    pub fn seconds(&self) -> i64 {
        match self {
            TimeGap::Second => 1,
            TimeGap::Minute => 60,
            TimeGap::Hour => 3600,
            TimeGap::Day => 86_400,
        }
    }
}

impl FromStr for TimeGap {
    type Err = LoggerError;

    /// Accepts `GAP_SECOND`-style names as well as bare `second`, `minute`...
    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_uppercase();
        match upper.strip_prefix("GAP_").unwrap_or(&upper) {
            "SECOND" => Ok(TimeGap::Second),
            "MINUTE" => Ok(TimeGap::Minute),
            "HOUR" => Ok(TimeGap::Hour),
            "DAY" => Ok(TimeGap::Day),
            _ => Err(LoggerError::config(
                "RollByTime",
                format!("unknown time gap '{}'", s),
            )),
        }
    }
}

/// Starts a new file whenever the wall clock enters a new gap bucket
///
/// Files are named `<base><YYYYmmddHHMMSS>.log`.
pub struct RollByTimeSink {
    base: String,
    gap: TimeGap,
    bucket: i64,
    current_path: PathBuf,
    writer: BufWriter<File>,
}

impl RollByTimeSink {
    pub fn new(base: impl Into<String>, gap: TimeGap) -> Result<Self> {
        let base = base.into();
        let current_path = Self::file_name(&base);
        let writer = open_append(&current_path)?;
        Ok(Self {
            bucket: Self::bucket_of(gap),
            base,
            gap,
            current_path,
            writer,
        })
    }

    fn bucket_of(gap: TimeGap) -> i64 {
        Utc::now().timestamp() / gap.seconds()
    }

    fn file_name(base: &str) -> PathBuf {
        PathBuf::from(format!("{}{}.log", base, Local::now().format(FILE_TIME_FORMAT)))
    }

    pub fn gap(&self) -> TimeGap {
        self.gap
    }

    pub fn current_path(&self) -> &PathBuf {
        &self.current_path
    }
}

impl Sink for RollByTimeSink {
    fn log(&mut self, data: &[u8]) -> Result<()> {
        let bucket = Self::bucket_of(self.gap);
        if bucket != self.bucket {
            self.writer.flush()?;
            let path = Self::file_name(&self.base);
            self.writer = open_append(&path)?;
            self.current_path = path;
            self.bucket = bucket;
        }
        self.writer.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "roll_by_time"
    }
}

impl Drop for RollByTimeSink {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
