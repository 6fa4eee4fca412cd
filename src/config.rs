//! Collector configuration
//!
//! TOML with one table per concern:
//!
//! ```toml
//! [Server]
//! port = 8888
//! workers = 4
//! pattern = "[%d{%H:%M:%S}][%c][%p]%T%m%n"
//! level = "DEBUG"
//!
//! [StdoutSink]
//! color = true
//!
//! [FileSink]
//! path = "./log/server.log"
//!
//! [RollBySize]
//! path = "./log/roll-"
//! size = 1048576
//!
//! [RollByTime]
//! path = "./log/time-"
//! type = "GAP_MINUTE"
//!
//! [DataBaseSink]
//! path = "./data/log.db"
//! ```
//!
//! Every section is optional. Sink sections that are present become sinks.

use crate::core::{LogLevel, Logger, LoggerError, Result, Sink, DEFAULT_PATTERN};
use crate::sinks::{ConsoleSink, FileSink, RollBySizeSink, RollByTimeSink, TimeGap};
use serde::{Deserialize, Deserializer};
use std::path::Path;
use std::str::FromStr;

// constants to define default values
const PORT: u16 = 8888;
const WORKERS: usize = 4;
const READ_BUFFER_SIZE: usize = 10 * 1024;
const ROLL_SIZE: u64 = 1024;
const ROLL_GAP: &str = "GAP_SECOND";

// helper functions
fn port() -> u16 {
    PORT
}

fn workers() -> usize {
    WORKERS
}

fn pattern() -> String {
    DEFAULT_PATTERN.to_string()
}

fn level() -> LogLevel {
    LogLevel::Debug
}

fn read_buffer_size() -> usize {
    READ_BUFFER_SIZE
}

fn roll_size() -> u64 {
    ROLL_SIZE
}

fn roll_gap() -> String {
    ROLL_GAP.to_string()
}

fn deserialize_level<'de, D>(deserializer: D) -> std::result::Result<LogLevel, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    name.parse().map_err(serde::de::Error::custom)
}

/// `[Server]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "port")]
    pub port: u16,
    #[serde(default = "workers")]
    pub workers: usize,
    #[serde(default = "pattern")]
    pub pattern: String,
    #[serde(default = "level", deserialize_with = "deserialize_level")]
    pub level: LogLevel,
    #[serde(default = "read_buffer_size")]
    pub read_buffer_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: port(),
            workers: workers(),
            pattern: pattern(),
            level: level(),
            read_buffer_size: read_buffer_size(),
        }
    }
}

/// `[StdoutSink]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StdoutSinkSettings {
    #[serde(default)]
    pub color: bool,
}

/// `[FileSink]` and `[DataBaseSink]` sections
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PathSinkSettings {
    pub path: String,
}

/// `[RollBySize]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RollBySizeSettings {
    pub path: String,
    #[serde(default = "roll_size")]
    pub size: u64,
}

/// `[RollByTime]` section
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RollByTimeSettings {
    pub path: String,
    #[serde(rename = "type", default = "roll_gap")]
    pub gap: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Sections {
    #[serde(rename = "Server", default)]
    server: ServerSettings,
    #[serde(rename = "StdoutSink")]
    stdout: Option<StdoutSinkSettings>,
    #[serde(rename = "FileSink")]
    file: Option<PathSinkSettings>,
    #[serde(rename = "RollBySize")]
    roll_by_size: Option<RollBySizeSettings>,
    #[serde(rename = "RollByTime")]
    roll_by_time: Option<RollByTimeSettings>,
    #[serde(rename = "DataBaseSink")]
    database: Option<PathSinkSettings>,
}

/// Parsed collector configuration
///
/// # Example
///
/// ```
/// use rust_log_relay::config::Config;
///
/// let config: Config = "[Server]\nport = 9000\n\n[StdoutSink]\ncolor = true\n".parse().unwrap();
/// assert_eq!(config.server().port, 9000);
/// assert_eq!(config.server().workers, 4);
/// assert_eq!(config.get("StdoutSink", "color").as_deref(), Some("true"));
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    raw: toml::Table,
    sections: Sections,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| LoggerError::io_operation("reading config file", path.display().to_string(), e))?;
        content.parse()
    }

    pub fn server(&self) -> &ServerSettings {
        &self.sections.server
    }

    pub fn stdout_sink(&self) -> Option<&StdoutSinkSettings> {
        self.sections.stdout.as_ref()
    }

    pub fn file_sink(&self) -> Option<&PathSinkSettings> {
        self.sections.file.as_ref()
    }

    pub fn roll_by_size(&self) -> Option<&RollBySizeSettings> {
        self.sections.roll_by_size.as_ref()
    }

    pub fn roll_by_time(&self) -> Option<&RollByTimeSettings> {
        self.sections.roll_by_time.as_ref()
    }

    pub fn database_sink(&self) -> Option<&PathSinkSettings> {
        self.sections.database.as_ref()
    }

    /// Raw value of `key` in `section`; strings are returned unquoted
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        let value = self.raw.get(section)?.get(key)?;
        Some(match value {
            toml::Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }

    /// Build every configured sink in the order StdoutSink, FileSink,
    /// RollBySize, RollByTime, DataBaseSink
    pub fn build_sinks(&self) -> Result<Vec<Box<dyn Sink>>> {
        let mut sinks: Vec<Box<dyn Sink>> = Vec::new();

        if let Some(stdout) = self.stdout_sink() {
            sinks.push(Box::new(ConsoleSink::with_colors(stdout.color)));
        }
        if let Some(file) = self.file_sink() {
            sinks.push(Box::new(FileSink::new(&file.path)?));
        }
        if let Some(roll) = self.roll_by_size() {
            sinks.push(Box::new(RollBySizeSink::new(roll.path.clone(), roll.size)?));
        }
        if let Some(roll) = self.roll_by_time() {
            let gap: TimeGap = roll.gap.parse()?;
            sinks.push(Box::new(RollByTimeSink::new(roll.path.clone(), gap)?));
        }
        if let Some(database) = self.database_sink() {
            sinks.push(Self::database_sink_for(&database.path)?);
        }

        Ok(sinks)
    }

    #[cfg(feature = "database")]
    fn database_sink_for(path: &str) -> Result<Box<dyn Sink>> {
        Ok(Box::new(crate::sinks::DatabaseSink::new(path)?))
    }

    #[cfg(not(feature = "database"))]
    fn database_sink_for(_path: &str) -> Result<Box<dyn Sink>> {
        Err(LoggerError::config(
            "DataBaseSink",
            "this build does not include the database feature",
        ))
    }

    /// Build the collector's own logger from `[Server]` and the sink sections
    pub fn build_logger(&self, name: &str) -> Result<Logger> {
        let server = self.server();
        let mut builder = Logger::builder(name)
            .pattern(server.pattern.clone())
            .min_level(server.level);
        for sink in self.build_sinks()? {
            builder = builder.boxed_sink(sink);
        }
        builder.build()
    }
}

impl FromStr for Config {
    type Err = LoggerError;

    fn from_str(content: &str) -> Result<Self> {
        Ok(Self {
            raw: content.parse::<toml::Table>()?,
            sections: toml::from_str(content)?,
        })
    }
}
