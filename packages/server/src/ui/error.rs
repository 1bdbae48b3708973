//! Fatal server errors.

use thiserror::Error;

/// Errors surfaced by [`SocketServer::start`](super::SocketServer::start).
///
/// Per-connection faults never show up here.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured host did not resolve to any address
    #[error("could not resolve listen address '{0}'")]
    AddressResolution(String),

    /// Binding or listening failed (port in use, invalid address, ...)
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
