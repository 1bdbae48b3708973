//! Request validation errors.

use thiserror::Error;

/// A record named a known verb but its fields were missing or mistyped.
///
/// Answered with an `error` record carrying `bad_request`; the connection
/// stays open.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("key must be non-empty string")]
    KeyRequired,

    #[error("payload must be JSON object")]
    PayloadNotObject,
}
