//! The device-push seam used by callers outside the server.

use std::net::SocketAddr;

use async_trait::async_trait;
use serde::Serialize;

use super::{ConnectionId, Record, Timestamp};

/// Snapshot of one registered connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionInfo {
    pub id: ConnectionId,
    pub remote_addr: SocketAddr,
    /// Name declared via `hello`, empty until then
    pub name: String,
    pub created_at: Timestamp,
    pub last_seen_at: Timestamp,
}

/// Push records to connected devices.
///
/// Implemented by the socket server; callers such as the operator console
/// depend on this trait rather than on the server itself.
#[async_trait]
pub trait DevicePusher: Send + Sync {
    /// Unicast a record. Returns `false` if the id is unknown or the write failed.
    async fn send(&self, id: &ConnectionId, payload: &Record) -> bool;

    /// Best-effort delivery to every connection except `exclude`.
    ///
    /// Returns the number of successful deliveries.
    async fn broadcast(&self, payload: &Record, exclude: Option<&ConnectionId>) -> usize;

    /// Snapshot of currently registered connections.
    async fn connections(&self) -> Vec<ConnectionInfo>;
}
