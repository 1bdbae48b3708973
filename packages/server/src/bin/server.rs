//! Fieldlink TCP server for field devices.
//!
//! Accepts newline-delimited JSON connections from I/O controllers, keeps a
//! live registry of them and answers the built-in protocol verbs.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin fieldlink-server
//! cargo run --bin fieldlink-server -- --host 127.0.0.1 --port 5020
//! ```

use std::time::Duration;

use clap::Parser;

use fieldlink_server::{ServerConfig, SocketServer, ui::signal::shutdown_signal};
use fieldlink_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "fieldlink-server")]
#[command(about = "TCP registry-and-broadcast server for field devices", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "502")]
    port: u16,

    /// Listen backlog
    #[arg(long, default_value = "128")]
    backlog: u32,

    /// Bytes requested per socket read
    #[arg(long, default_value = "4096")]
    read_chunk_size: usize,

    /// Per-read timeout in milliseconds
    #[arg(long, default_value = "1000")]
    read_timeout_ms: u64,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            backlog: self.backlog,
            read_chunk_size: self.read_chunk_size,
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            ..ServerConfig::new(self.host.clone(), self.port)
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let server = SocketServer::new(args.server_config());
    if let Err(e) = server.start().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Press Ctrl+C to shutdown gracefully");
    shutdown_signal().await;

    server.stop().await;
    tracing::info!("Server shutdown complete");
}
