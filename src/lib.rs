//! # Rust Log Relay
//!
//! An embeddable logging framework whose records can be written locally or
//! shipped to a central collector that re-renders and persists them again.
//!
//! ## Features
//!
//! - **Async pipeline**: producers append rendered bytes to an elastic double
//!   buffer; one consumer thread writes whole epochs to the sinks
//! - **Backpressure**: `Safe` mode bounds memory by making producers wait,
//!   `Unsafe` mode never waits
//! - **Sinks**: console, file, rolling by size or time, SQLite, UDP and TCP
//! - **Collector**: length-prefixed frames over TCP (or single datagrams over
//!   UDP), decoded on a fixed worker pool and re-dispatched to local sinks
//!
//! ```
//! use rust_log_relay::prelude::*;
//! use rust_log_relay::info;
//!
//! let memory = MemorySink::new();
//! let logger = Logger::builder("app")
//!     .pattern("[%p][%c] %m%n")
//!     .sink(memory.clone())
//!     .build()
//!     .unwrap();
//!
//! info!(logger, "listening on {}", 8080).unwrap();
//! assert_eq!(memory.contents(), "[INFO][app] listening on 8080\n");
//! ```

pub mod config;
pub mod core;
pub mod macros;
#[cfg(feature = "network")]
pub mod net;
pub mod sinks;

pub mod prelude {
    pub use crate::config::{Config, ServerSettings};
    pub use crate::core::{
        BackpressureMode, Formatter, LogLevel, LogRecord, Logger, LoggerBuilder, LoggerError,
        LoggerMetrics, LoggerRegistry, MemorySink, Result, Sink,
    };
    pub use crate::sinks::{ConsoleSink, FileSink, RollBySizeSink, RollByTimeSink, TimeGap};
}

pub use config::{Config, ServerSettings};
pub use core::{
    AsyncPipeline, BackpressureMode, ElasticBuffer, Formatter, LogLevel, LogRecord, Logger,
    LoggerBuilder, LoggerError, LoggerMetrics, LoggerRegistry, MemorySink, PipelineStatus, Result,
    ServerMetrics, Sink, DEFAULT_PATTERN,
};
pub use sinks::{ConsoleSink, FileSink};
