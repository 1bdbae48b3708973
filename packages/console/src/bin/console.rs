//! Operator console with an embedded Fieldlink server.
//!
//! Starts the socket server, then reads DO commands from the terminal and
//! pushes them to connected devices. Type `help` for the command list.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin fieldlink-console
//! cargo run --bin fieldlink-console -- --host 127.0.0.1 --port 5020
//! ```

use std::sync::Arc;

use clap::Parser;

use fieldlink_console::run_console;
use fieldlink_server::{ServerConfig, SocketServer};
use fieldlink_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "fieldlink-console")]
#[command(about = "Operator console pushing DO commands to Fieldlink devices", long_about = None)]
struct Args {
    /// Host address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port number to listen on
    #[arg(short = 'p', long, default_value = "502")]
    port: u16,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let server = Arc::new(SocketServer::new(ServerConfig::new(args.host, args.port)));
    match server.start().await {
        Ok(addr) => println!("Server listening on {}", addr),
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    }

    run_console(server.clone()).await;

    server.stop().await;
    println!("Server stopped.");
}
