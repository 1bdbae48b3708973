//! Server configuration.

use std::time::Duration;

/// Options injected into [`SocketServer::new`](crate::SocketServer::new).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen host (e.g., "0.0.0.0")
    pub host: String,
    /// Listen port; 0 picks an ephemeral port
    pub port: u16,
    /// Listen backlog
    pub backlog: u32,
    /// Bytes requested per read
    pub read_chunk_size: usize,
    /// Bound on each read, also the stop-signal polling interval of sessions
    pub read_timeout: Duration,
    /// Bound on each accept attempt
    pub accept_timeout: Duration,
    /// Bound on each record write; a peer that stalls longer is dropped
    pub write_timeout: Duration,
    /// Largest unterminated line kept in a decode buffer
    pub max_line_bytes: usize,
    /// How long `stop()` waits for the acceptor to exit
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 502,
            backlog: 128,
            read_chunk_size: 4096,
            read_timeout: Duration::from_secs(1),
            accept_timeout: Duration::from_secs(1),
            write_timeout: Duration::from_secs(5),
            max_line_bytes: 1024 * 1024,
            shutdown_grace: Duration::from_secs(2),
        }
    }
}

impl ServerConfig {
    /// Configuration bound to `host:port` with every other option at its default.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    /// The `host:port` string used for binding and logging.
    pub fn bind_addr(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}
