//! Wire format for shipped records
//!
//! A TCP frame is a big-endian `u32` payload length followed by the payload,
//! a JSON object tagged by `"mode"`:
//!
//! ```text
//! {"mode":"format","ctime":1700000000,"line":12,"tid":"ThreadId(2)",
//!  "level":"INFO","file":"main.rs","logger":"app","payload":"ready"}
//! {"mode":"unformatted","text":"[12:00:00][INFO] ready\n"}
//! ```
//!
//! UDP datagrams carry the same JSON without the length prefix.

use crate::core::{LogLevel, LogRecord, LoggerError, Result};
use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// Size of the length prefix
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Largest payload a [`FrameDecoder`] accepts by default (16 MiB)
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Structured fields of a `format` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFields {
    pub ctime: i64,
    pub line: u32,
    pub tid: String,
    pub level: String,
    pub file: String,
    pub logger: String,
    pub payload: String,
}

impl RecordFields {
    /// Rebuild the record, keeping the shipped message untouched
    pub fn into_record(self) -> Result<LogRecord> {
        let level: LogLevel = self
            .level
            .parse()
            .map_err(|e: String| LoggerError::protocol(e))?;
        Ok(LogRecord::from_parts(
            self.ctime,
            level,
            self.file,
            self.line,
            self.tid,
            self.logger,
            self.payload,
        ))
    }
}

/// One shipped unit of log data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Payload {
    /// Structured record, re-rendered by the receiver
    Format(RecordFields),
    /// Final text, written by the receiver as is
    Unformatted { text: String },
}

impl Payload {
    pub fn from_record(record: &LogRecord) -> Self {
        Payload::Format(RecordFields {
            ctime: record.timestamp(),
            line: record.line(),
            tid: record.thread_id().to_string(),
            level: record.level().to_str().to_string(),
            file: record.file().to_string(),
            logger: record.logger().to_string(),
            payload: record.message().to_string(),
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Payload::Unformatted { text: text.into() }
    }
}

/// Encode `payload` as one length-prefixed frame
pub fn encode_frame(payload: &Payload) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(payload)?;
    let len = u32::try_from(body.len())
        .map_err(|_| LoggerError::protocol(format!("payload of {} bytes exceeds u32", body.len())))?;

    let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_LEN + body.len());
    frame.put_u32(len);
    frame.put_slice(&body);
    Ok(frame.to_vec())
}

/// Encode `payload` for a single UDP datagram
pub fn encode_datagram(payload: &Payload) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(payload)?)
}

pub fn decode_datagram(datagram: &[u8]) -> Result<Payload> {
    serde_json::from_slice(datagram)
        .map_err(|e| LoggerError::protocol(format!("invalid datagram payload: {}", e)))
}

/// Reassembles frames from an arbitrarily split byte stream
///
/// Bytes that do not yet form a complete frame stay buffered until the next
/// [`extend`](FrameDecoder::extend).
///
/// # Example
///
/// ```
/// use rust_log_relay::net::{encode_frame, FrameDecoder, Payload};
///
/// let frame = encode_frame(&Payload::text("hello\n")).unwrap();
/// let mut decoder = FrameDecoder::new();
///
/// decoder.extend(&frame[..3]);
/// assert!(decoder.decode_next().unwrap().is_none());
///
/// decoder.extend(&frame[3..]);
/// assert_eq!(decoder.decode_next().unwrap(), Some(Payload::text("hello\n")));
/// ```
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: BytesMut,
    max_frame_len: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::with_max_frame_len(DEFAULT_MAX_FRAME_LEN)
    }

    pub fn with_max_frame_len(max_frame_len: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            max_frame_len,
        }
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Take the next complete frame, or `None` if more bytes are needed.
    ///
    /// A declared length above the maximum frame length, or a payload that
    /// is not a valid [`Payload`], is a protocol error.
    pub fn decode_next(&mut self) -> Result<Option<Payload>> {
        if self.buffer.len() < LENGTH_PREFIX_LEN {
            return Ok(None);
        }

        let mut prefix = [0u8; LENGTH_PREFIX_LEN];
        prefix.copy_from_slice(&self.buffer[..LENGTH_PREFIX_LEN]);
        let len = u32::from_be_bytes(prefix) as usize;

        if len > self.max_frame_len {
            return Err(LoggerError::protocol(format!(
                "declared frame length {} exceeds limit {}",
                len, self.max_frame_len
            )));
        }

        // Grow with the bytes that actually arrive, not the declared length
        if self.buffer.len() < LENGTH_PREFIX_LEN + len {
            return Ok(None);
        }

        self.buffer.advance(LENGTH_PREFIX_LEN);
        let body = self.buffer.split_to(len);
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| LoggerError::protocol(format!("invalid frame payload: {}", e)))
    }

    /// Bytes held back waiting for the rest of a frame
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
