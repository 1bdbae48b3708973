//! Domain error types.

use thiserror::Error;

/// Value object validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueObjectError {
    #[error("connection id must not be empty")]
    ConnectionIdEmpty,
}

/// Transport failure on a single connection.
///
/// Always local to that connection: the caller drops it and carries on.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The connection was already closed
    #[error("connection is closed")]
    Closed,

    /// The record could not be encoded
    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),

    /// The socket write failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer did not drain the socket in time
    #[error("write timed out")]
    WriteTimeout,
}
