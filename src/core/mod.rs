//! Core logger types and traits

pub mod buffer;
pub mod error;
pub mod formatter;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod pipeline;
pub mod record;
pub mod registry;
pub mod sink;

pub use buffer::ElasticBuffer;
pub use error::{LoggerError, Result};
pub use formatter::{Formatter, DEFAULT_PATTERN};
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder};
pub use metrics::{LoggerMetrics, ServerMetrics};
pub use pipeline::{AsyncPipeline, BackpressureMode, FlushCallback, PipelineStatus};
pub use record::LogRecord;
pub use registry::{LoggerRegistry, ROOT_LOGGER_NAME};
pub use sink::{MemorySink, Sink};
