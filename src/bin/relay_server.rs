//! Log collector
//!
//! ```text
//! relay-server <config.toml>
//! ```
//!
//! Builds the collector's logger and sinks from the config file and serves
//! the accept loop in the foreground.

use rust_log_relay::net::TcpLogServer;
use rust_log_relay::prelude::*;
use std::process::ExitCode;
use std::sync::Arc;

fn run(path: &str) -> Result<()> {
    let config = Config::load(path)?;
    let registry = LoggerRegistry::new()?;
    let diagnostics = registry.default_logger();

    let collector = registry.register(config.build_logger("collector")?);
    let settings = config.server();
    diagnostics.info(format!(
        "loaded {} (port {}, {} workers, {} sinks)",
        path,
        settings.port,
        settings.workers,
        collector.sink_count()
    ))?;

    let server = TcpLogServer::from_settings(settings, Arc::clone(&collector))?
        .diagnostics(Arc::clone(&diagnostics));
    server.run()?;

    collector.shutdown()
}

fn main() -> ExitCode {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "relay-server".to_string());
    let Some(path) = args.next() else {
        eprintln!("Usage:\n\t{} <config.toml>", program);
        return ExitCode::from(2);
    };

    match run(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("relay-server: {}", e);
            ExitCode::FAILURE
        }
    }
}
