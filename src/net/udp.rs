//! UDP log collector
//!
//! Every datagram carries exactly one payload, so no reassembly is needed.
//! A malformed datagram is counted and skipped; a sink failure stops the
//! collector.

use super::codec::decode_datagram;
use super::server::{loopback_for, relay, report, Disconnect};
use crate::core::{LogLevel, Logger, LoggerError, Result, ServerMetrics};
use std::io::ErrorKind;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Largest datagram the collector reads
pub const MAX_DATAGRAM_LEN: usize = 64 * 1024;

pub struct UdpLogServer {
    socket: UdpSocket,
    local_addr: SocketAddr,
    logger: Arc<Logger>,
    diagnostics: Option<Arc<Logger>>,
    metrics: Arc<ServerMetrics>,
    stopping: AtomicBool,
}

impl UdpLogServer {
    pub fn bind(addr: impl ToSocketAddrs + ToString, logger: Arc<Logger>) -> Result<Self> {
        let display = addr.to_string();
        let socket = UdpSocket::bind(addr)
            .map_err(|e| LoggerError::io_operation("binding udp collector", display, e))?;
        let local_addr = socket.local_addr()?;
        Ok(Self {
            socket,
            local_addr,
            logger,
            diagnostics: None,
            metrics: Arc::new(ServerMetrics::new()),
            stopping: AtomicBool::new(false),
        })
    }

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

    /// Receive datagrams until shut down
    pub fn run(&self) -> Result<()> {
        let mut datagram = vec![0u8; MAX_DATAGRAM_LEN];
        loop {
            let (n, peer) = match self.socket.recv_from(&mut datagram) {
                Ok(received) => received,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(LoggerError::io_operation(
                        "receiving datagram",
                        self.local_addr.to_string(),
                        e,
                    ))
                }
            };
            if self.stopping.load(Ordering::Acquire) {
                return Ok(());
            }
            self.metrics.record_received(n);

            let outcome = decode_datagram(&datagram[..n])
                .map_err(Disconnect::Peer)
                .and_then(|payload| {
                    self.metrics.record_frame();
                    relay(&self.logger, payload)
                });
            match outcome {
                Ok(()) => {}
                Err(Disconnect::Peer(e)) => {
                    self.metrics.record_protocol_error();
                    report(
                        &self.diagnostics,
                        LogLevel::Warn,
                        format!("dropped datagram from {}: {}", peer, e),
                    );
                }
                Err(Disconnect::Sink(e)) => {
                    report(
                        &self.diagnostics,
                        LogLevel::Fatal,
                        format!("udp collector stopping, sink failed on datagram from {}: {}", peer, e),
                    );
                    return Err(e);
                }
            }
        }
    }

    /// Run the receive loop on a thread named `relay-udp`
    pub fn spawn(self) -> Result<UdpServerHandle> {
        let server = Arc::new(self);
        let runner = Arc::clone(&server);
        let receiver = thread::Builder::new()
            .name("relay-udp".to_string())
            .spawn(move || runner.run())
            .map_err(|e| LoggerError::io_operation("spawning udp thread", server.local_addr.to_string(), e))?;
        Ok(UdpServerHandle {
            server,
            receiver: Some(receiver),
        })
    }
}

/// A running [`UdpLogServer`]
pub struct UdpServerHandle {
    server: Arc<UdpLogServer>,
    receiver: Option<thread::JoinHandle<Result<()>>>,
}

impl UdpServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr
    }

    pub fn metrics(&self) -> &ServerMetrics {
        self.server.metrics()
    }

    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        let Some(receiver) = self.receiver.take() else {
            return Ok(());
        };
        self.server.stopping.store(true, Ordering::Release);
        // Wake recv_from with an empty datagram
        let target = loopback_for(self.server.local_addr);
        let bind_addr = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        if let Ok(waker) = UdpSocket::bind(bind_addr) {
            let _ = waker.send_to(&[], target);
        }
        receiver
            .join()
            .unwrap_or_else(|_| Err(LoggerError::protocol("udp thread panicked")))
    }
}

impl Drop for UdpServerHandle {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            eprintln!("[LOGGER ERROR] UDP collector shutdown failed: {}", e);
        }
    }
}
