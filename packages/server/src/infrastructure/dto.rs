//! Server-originated wire records.
//!
//! Every record carries a millisecond `ts`. Replies echo the request's
//! correlation `id` (JSON `null` when the request had none).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ConnectionId, Record};

/// Error codes carried by `error` records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    BadRequest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerRecord {
    /// Sent once right after accept
    Welcome { client_id: ConnectionId, ts: i64 },
    Pong { id: Value, ts: i64 },
    HelloAck {
        id: Value,
        client_id: ConnectionId,
        ts: i64,
    },
    SetAck { id: Value, key: String, ts: i64 },
    GetAck {
        id: Value,
        key: String,
        value: Value,
        ts: i64,
    },
    BroadcastAck { id: Value, sent: usize, ts: i64 },
    /// Generic acknowledgement for verbs the server does not interpret
    Ack {
        id: Value,
        received_type: String,
        ts: i64,
    },
    /// Relay of a peer's `broadcast` payload
    Signal {
        from: ConnectionId,
        payload: Record,
        ts: i64,
    },
    Error {
        id: Value,
        code: ErrorCode,
        details: String,
        ts: i64,
    },
}
