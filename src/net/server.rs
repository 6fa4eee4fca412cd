//! TCP log collector
//!
//! One thread accepts connections; each connection becomes one long-lived
//! task on the [`WorkerPool`], so the pool size bounds how many clients are
//! served at once. Received records are re-rendered by the server's own
//! [`Logger`] and written to its sinks.
//!
//! A client that breaks the protocol only loses its own connection. A sink
//! failure stops the whole collector and is returned from
//! [`TcpLogServer::run`] and [`ServerHandle::shutdown`].

use super::codec::{FrameDecoder, Payload, DEFAULT_MAX_FRAME_LEN};
use super::pool::WorkerPool;
use crate::config::ServerSettings;
use crate::core::{LogLevel, Logger, LoggerError, Result, ServerMetrics};
use parking_lot::Mutex;
use std::io::{ErrorKind, Read};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::panic::Location;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Size of the per-connection staging read buffer (10 KiB)
pub const DEFAULT_READ_BUFFER_SIZE: usize = 10 * 1024;

/// Why a client's data could not be relayed
pub(crate) enum Disconnect {
    /// The client broke the stream or the protocol; only that client is dropped
    Peer(LoggerError),
    /// The collector's own sinks failed; the whole collector stops
    Sink(LoggerError),
}

/// Hand a decoded payload to `logger`
pub(crate) fn relay(logger: &Logger, payload: Payload) -> std::result::Result<(), Disconnect> {
    match payload {
        Payload::Format(fields) => {
            let record = fields.into_record().map_err(Disconnect::Peer)?;
            logger.log_record(&record).map_err(Disconnect::Sink)
        }
        Payload::Unformatted { text } => logger.log_rendered(text.as_bytes()).map_err(Disconnect::Sink),
    }
}

/// Write a collector diagnostic, falling back to stderr
#[track_caller]
pub(crate) fn report(diagnostics: &Option<Arc<Logger>>, level: LogLevel, message: String) {
    match diagnostics {
        Some(logger) => {
            let location = Location::caller();
            let result = logger.log_at(level, location.file(), location.line(), format_args!("{}", message));
            if let Err(e) = result {
                eprintln!("[LOGGER ERROR] Diagnostics logger failed: {} ({})", e, message);
            }
        }
        None if level >= LogLevel::Warn => eprintln!("[LOGGER ERROR] {}", message),
        None => {}
    }
}

/// Stop flag and first fatal error, shared by the accept loop and its
/// connections
struct Control {
    local_addr: SocketAddr,
    stopping: AtomicBool,
    failure: Mutex<Option<LoggerError>>,
}

impl Control {
    fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    fn request_stop(&self) {
        self.stopping.store(true, Ordering::Release);
        // Unblock accept(); the loop sees the flag and drops this connection
        let _ = TcpStream::connect(loopback_for(self.local_addr));
    }

    /// Keep the first fatal error and stop accepting
    fn fail(&self, error: LoggerError) {
        {
            let mut failure = self.failure.lock();
            if failure.is_none() {
                *failure = Some(error);
            }
        }
        self.request_stop();
    }

    fn take_failure(&self) -> Option<LoggerError> {
        self.failure.lock().take()
    }
}

/// Address that reaches a listener bound to `addr` from this host
pub(crate) fn loopback_for(addr: SocketAddr) -> SocketAddr {
    match addr {
        SocketAddr::V4(v4) if v4.ip().is_unspecified() => {
            SocketAddr::new(Ipv4Addr::LOCALHOST.into(), v4.port())
        }
        SocketAddr::V6(v6) if v6.ip().is_unspecified() => {
            SocketAddr::new(Ipv6Addr::LOCALHOST.into(), v6.port())
        }
        other => other,
    }
}

/// # Example
///
/// ```no_run
/// use rust_log_relay::prelude::*;
/// use rust_log_relay::net::TcpLogServer;
/// use std::sync::Arc;
///
/// let logger = Arc::new(
///     Logger::builder("collector")
///         .pattern("[%d{%H:%M:%S}][%c][%p] %m%n")
///         .sink(FileSink::new("./log/collected.log").unwrap())
///         .build()
///         .unwrap(),
/// );
///
/// let handle = TcpLogServer::bind("0.0.0.0:8888", logger, 4)
///     .unwrap()
///     .spawn()
///     .unwrap();
/// // ...
/// handle.shutdown().unwrap();
/// ```
pub struct TcpLogServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    logger: Arc<Logger>,
    diagnostics: Option<Arc<Logger>>,
    pool: WorkerPool,
    read_buffer_size: usize,
    max_frame_len: usize,
    metrics: Arc<ServerMetrics>,
    control: Arc<Control>,
}

impl TcpLogServer {
    /// Bind `addr` and start `workers` connection workers
    pub fn bind(addr: impl ToSocketAddrs + ToString, logger: Arc<Logger>, workers: usize) -> Result<Self> {
        let display = addr.to_string();
        let pool = WorkerPool::new(workers)?;
        let listener = TcpListener::bind(addr)
            .map_err(|e| LoggerError::io_operation("binding collector listener", display, e))?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
            logger,
            diagnostics: None,
            pool,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            metrics: Arc::new(ServerMetrics::new()),
            control: Arc::new(Control {
                local_addr,
                stopping: AtomicBool::new(false),
                failure: Mutex::new(None),
            }),
        })
    }

    /// Bind all interfaces on the configured port
    pub fn from_settings(settings: &ServerSettings, logger: Arc<Logger>) -> Result<Self> {
        Ok(Self::bind(format!("0.0.0.0:{}", settings.port), logger, settings.workers)?
            .read_buffer_size(settings.read_buffer_size))
    }

    #[must_use]
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    #[must_use]
    pub fn max_frame_len(mut self, len: usize) -> Self {
        self.max_frame_len = len;
        self
    }

    /// Report connection lifecycle and protocol problems to `logger`
    #[must_use]
    pub fn diagnostics(mut self, logger: Arc<Logger>) -> Self {
        self.diagnostics = Some(logger);
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn metrics(&self) -> &ServerMetrics {
        &self.metrics
    }

    pub fn worker_count(&self) -> usize {
        self.pool.size()
    }

    /// Accept connections until the server is shut down.
    ///
    /// Blocks the calling thread. Accept failures other than interruption
    /// end the loop with an error, and so does a sink failure on any
    /// connection.
    pub fn run(&self) -> Result<()> {
        report(
            &self.diagnostics,
            LogLevel::Info,
            format!("collector listening on {} with {} workers", self.local_addr, self.pool.size()),
        );

        loop {
            let (stream, peer) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    if self.control.is_stopping() {
                        break;
                    }
                    return Err(LoggerError::io_operation(
                        "accepting connection",
                        self.local_addr.to_string(),
                        e,
                    ));
                }
            };
            if self.control.is_stopping() {
                break;
            }

            self.metrics.record_connection();
            report(&self.diagnostics, LogLevel::Debug, format!("accepted connection from {}", peer));

            let connection = Connection {
                stream,
                peer,
                logger: Arc::clone(&self.logger),
                diagnostics: self.diagnostics.clone(),
                metrics: Arc::clone(&self.metrics),
                control: Arc::clone(&self.control),
                read_buffer_size: self.read_buffer_size,
                max_frame_len: self.max_frame_len,
            };
            self.pool.submit(move || connection.run())?;
        }

        report(&self.diagnostics, LogLevel::Info, format!("collector on {} stopped accepting", self.local_addr));
        match self.control.take_failure() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Run the accept loop on a thread named `relay-accept`
    pub fn spawn(self) -> Result<ServerHandle> {
        let server = Arc::new(self);
        let runner = Arc::clone(&server);
        let accept = thread::Builder::new()
            .name("relay-accept".to_string())
            .spawn(move || runner.run())
            .map_err(|e| LoggerError::io_operation("spawning accept thread", server.local_addr.to_string(), e))?;

        Ok(ServerHandle {
            server,
            accept: Some(accept),
        })
    }
}

/// A running [`TcpLogServer`]
pub struct ServerHandle {
    server: Arc<TcpLogServer>,
    accept: Option<thread::JoinHandle<Result<()>>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr
    }

    pub fn metrics(&self) -> &ServerMetrics {
        self.server.metrics()
    }

    /// Stop accepting, wait for open connections to close, then stop the pool.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        let Some(accept) = self.accept.take() else {
            return Ok(());
        };
        self.server.control.request_stop();
        let result = accept
            .join()
            .unwrap_or_else(|_| Err(LoggerError::protocol("accept thread panicked")));
        self.server.pool.stop();
        // A connection may have failed after the accept loop returned
        match self.server.control.take_failure() {
            Some(e) if result.is_ok() => Err(e),
            _ => result,
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            eprintln!("[LOGGER ERROR] Collector shutdown failed: {}", e);
        }
    }
}

/// State of one accepted client, owned by the worker serving it
struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    logger: Arc<Logger>,
    diagnostics: Option<Arc<Logger>>,
    metrics: Arc<ServerMetrics>,
    control: Arc<Control>,
    read_buffer_size: usize,
    max_frame_len: usize,
}

impl Connection {
    fn run(mut self) {
        match self.serve() {
            Ok(()) => report(
                &self.diagnostics,
                LogLevel::Debug,
                format!("connection from {} closed", self.peer),
            ),
            Err(Disconnect::Peer(e)) => {
                if matches!(e, LoggerError::Protocol(_)) {
                    self.metrics.record_protocol_error();
                }
                report(
                    &self.diagnostics,
                    LogLevel::Error,
                    format!("connection from {} dropped: {}", self.peer, e),
                );
            }
            Err(Disconnect::Sink(e)) => {
                report(
                    &self.diagnostics,
                    LogLevel::Fatal,
                    format!("collector stopping, sink failed on record from {}: {}", self.peer, e),
                );
                self.control.fail(e);
            }
        }
    }

    fn serve(&mut self) -> std::result::Result<(), Disconnect> {
        let mut decoder = FrameDecoder::with_max_frame_len(self.max_frame_len);
        let mut staging = vec![0u8; self.read_buffer_size];

        loop {
            let n = match self.stream.read(&mut staging) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(Disconnect::Peer(LoggerError::io_operation(
                        "reading from client",
                        self.peer.to_string(),
                        e,
                    )))
                }
            };
            self.metrics.record_received(n);
            decoder.extend(&staging[..n]);

            while let Some(payload) = decoder.decode_next().map_err(Disconnect::Peer)? {
                self.metrics.record_frame();
                relay(&self.logger, payload)?;
            }
        }

        if !decoder.is_empty() {
            report(
                &self.diagnostics,
                LogLevel::Warn,
                format!(
                    "connection from {} closed inside a frame, {} bytes discarded",
                    self.peer,
                    decoder.buffered_len()
                ),
            );
        }
        Ok(())
    }
}
