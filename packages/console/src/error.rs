//! Error types for operator input.

use thiserror::Error;

/// Reasons an input line is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// `cid:` given without an id
    #[error("missing client id after 'cid:' (e.g., cid:abcd1234 1 0 0 1)")]
    MissingConnectionId,

    /// No DO values given
    #[error("missing DO values (e.g., 1 0 0 1)")]
    MissingValues,

    /// A DO value other than 0 or 1
    #[error("invalid DO value '{0}': each value must be 0 or 1")]
    InvalidValue(String),
}
