//! Network sinks shipping records to a collector
//!
//! Structured records go out as `format` payloads and are re-rendered by the
//! collector; raw text goes out as `unformatted` payloads.

use crate::core::{LogRecord, LoggerError, Result, Sink};
use crate::net::codec::{encode_datagram, encode_frame, Payload};
use std::io::Write;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::time::Duration;

const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

fn resolve(addr: impl ToSocketAddrs + ToString) -> Result<SocketAddr> {
    let display = addr.to_string();
    addr.to_socket_addrs()
        .map_err(|e| LoggerError::io_operation("resolving collector address", display.clone(), e))?
        .next()
        .ok_or_else(|| LoggerError::config("network sink", format!("'{}' resolved to no address", display)))
}

/// Split rendered text into records, one per line, each keeping its newline
fn rendered_lines(data: &[u8]) -> impl Iterator<Item = &[u8]> {
    data.split_inclusive(|b| *b == b'\n')
        .filter(|line| line.iter().any(|b| *b != b'\n'))
}

/// Sends one datagram per record
pub struct UdpSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpSink {
    pub fn new(addr: impl ToSocketAddrs + ToString) -> Result<Self> {
        let target = resolve(addr)?;
        let bind_addr = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind_addr)
            .map_err(|e| LoggerError::io_operation("binding udp sink socket", bind_addr, e))?;
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    fn send(&self, payload: &Payload) -> Result<()> {
        let datagram = encode_datagram(payload)?;
        self.socket
            .send_to(&datagram, self.target)
            .map_err(|e| LoggerError::io_operation("sending log datagram", self.target.to_string(), e))?;
        Ok(())
    }
}

impl Sink for UdpSink {
    /// One datagram per line, so an async epoch never exceeds a datagram
    fn log(&mut self, data: &[u8]) -> Result<()> {
        for line in rendered_lines(data) {
            self.send(&Payload::text(String::from_utf8_lossy(line)))?;
        }
        Ok(())
    }

    fn log_record(&mut self, record: &LogRecord, _rendered: &[u8]) -> Result<()> {
        self.send(&Payload::from_record(record))
    }

    fn name(&self) -> &str {
        "udp"
    }
}

/// Sends one length-prefixed frame per record
///
/// By default every record opens a fresh connection, sends its frame and
/// closes. [`persistent`](TcpSink::persistent) keeps one connection open
/// instead; a failed write drops it and the next record reconnects.
///
/// # Example
///
/// ```no_run
/// use rust_log_relay::prelude::*;
/// use rust_log_relay::sinks::TcpSink;
///
/// let logger = Logger::builder("client")
///     .sink(TcpSink::new("127.0.0.1:8888").unwrap())
///     .build()
///     .unwrap();
/// logger.info("shipped to the collector").unwrap();
/// ```
pub struct TcpSink {
    target: SocketAddr,
    persistent: bool,
    stream: Option<TcpStream>,
}

impl TcpSink {
    pub fn new(addr: impl ToSocketAddrs + ToString) -> Result<Self> {
        Ok(Self {
            target: resolve(addr)?,
            persistent: false,
            stream: None,
        })
    }

    #[must_use]
    pub fn persistent(mut self, persistent: bool) -> Self {
        self.persistent = persistent;
        self
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    fn connect(&self) -> Result<TcpStream> {
        let stream = TcpStream::connect(self.target)
            .map_err(|e| LoggerError::io_operation("connecting to collector", self.target.to_string(), e))?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        stream.set_nodelay(true)?;
        Ok(stream)
    }

    /// Write already encoded frames on one connection
    fn send(&mut self, frames: &[u8]) -> Result<()> {
        if frames.is_empty() {
            return Ok(());
        }

        let mut stream = match self.stream.take() {
            Some(stream) => stream,
            None => self.connect()?,
        };
        stream
            .write_all(frames)
            .map_err(|e| LoggerError::io_operation("sending log frame", self.target.to_string(), e))?;

        if self.persistent {
            self.stream = Some(stream);
        }
        Ok(())
    }
}

impl Sink for TcpSink {
    /// One frame per line; an async epoch goes out on a single connection
    fn log(&mut self, data: &[u8]) -> Result<()> {
        let mut frames = Vec::with_capacity(data.len() + 64);
        for line in rendered_lines(data) {
            frames.extend(encode_frame(&Payload::text(String::from_utf8_lossy(line)))?);
        }
        self.send(&frames)
    }

    fn log_record(&mut self, record: &LogRecord, _rendered: &[u8]) -> Result<()> {
        self.send(&encode_frame(&Payload::from_record(record))?)
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut stream) = self.stream {
            stream.flush()?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "tcp"
    }
}
