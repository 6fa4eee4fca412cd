//! Sink implementations

pub mod console;
pub mod file;
pub mod rolling;

#[cfg(feature = "database")]
pub mod database;

#[cfg(feature = "network")]
pub mod network;

pub use console::ConsoleSink;
pub use file::FileSink;
pub use rolling::{RollBySizeSink, RollByTimeSink, TimeGap};

#[cfg(feature = "database")]
pub use database::DatabaseSink;

#[cfg(feature = "network")]
pub use network::{TcpSink, UdpSink};

// Re-export the trait next to its implementations
pub use crate::core::{MemorySink, Sink};
