//! Live registry of connected peers.
//!
//! An id is present exactly while its connection is accepted and not yet
//! dropped. Removal is terminal; ids are never reused.

use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::domain::{ConnectionId, ConnectionInfo};

use super::{codec::encode_record, connection::Connection};

#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<ConnectionId, Arc<Connection>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, connection: Arc<Connection>) {
        let mut clients = self.clients.lock().await;
        clients.insert(connection.id().clone(), connection);
    }

    pub async fn get(&self, id: &ConnectionId) -> Option<Arc<Connection>> {
        self.clients.lock().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.clients.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.lock().await.is_empty()
    }

    /// Connections registered right now.
    pub async fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.clients.lock().await.values().cloned().collect()
    }

    /// Remove a connection and close it.
    ///
    /// Returns `false` if it was already gone, in which case whoever removed
    /// it owns the close.
    pub async fn drop_connection(&self, id: &ConnectionId) -> bool {
        let removed = self.clients.lock().await.remove(id);
        match removed {
            Some(connection) => {
                connection.close().await;
                info!(
                    id = %id,
                    addr = %connection.remote_addr(),
                    "client disconnected"
                );
                true
            }
            None => false,
        }
    }

    /// Capture and clear every entry under one lock, then close each one.
    pub async fn close_all(&self) -> usize {
        let drained: Vec<Arc<Connection>> = {
            let mut clients = self.clients.lock().await;
            clients.drain().map(|(_, connection)| connection).collect()
        };
        for connection in &drained {
            connection.close().await;
        }
        drained.len()
    }

    /// Unicast. Unknown ids return `false`; a failed write drops the target.
    pub async fn send<T>(&self, id: &ConnectionId, record: &T) -> bool
    where
        T: Serialize + ?Sized,
    {
        let Some(connection) = self.get(id).await else {
            return false;
        };

        match connection.send_record(record).await {
            Ok(()) => true,
            Err(e) => {
                warn!(id = %id, error = %e, "send failed, dropping client");
                self.drop_connection(id).await;
                false
            }
        }
    }

    /// Best-effort delivery to a snapshot of the registry.
    ///
    /// Targets that fail are dropped; the rest still receive the record.
    /// Returns the number of successful deliveries.
    pub async fn broadcast<T>(&self, record: &T, exclude: Option<&ConnectionId>) -> usize
    where
        T: Serialize + ?Sized,
    {
        let encoded = match encode_record(record) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(error = %e, "failed to encode broadcast record");
                return 0;
            }
        };

        let targets: Vec<Arc<Connection>> = self
            .snapshot()
            .await
            .into_iter()
            .filter(|connection| exclude != Some(connection.id()))
            .collect();

        let encoded = encoded.as_slice();
        let results = join_all(targets.iter().map(|connection| async move {
            (connection, connection.send_encoded(encoded).await)
        }))
        .await;

        let mut sent = 0;
        for (connection, result) in results {
            match result {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!(id = %connection.id(), error = %e, "broadcast failed, dropping client");
                    self.drop_connection(connection.id()).await;
                }
            }
        }
        sent
    }

    /// The earliest-accepted connection whose remote host matches `host`.
    pub async fn find_by_host(&self, host: &str) -> Option<Arc<Connection>> {
        let clients = self.clients.lock().await;
        clients
            .values()
            .filter(|connection| host_matches(&connection.remote_addr(), host))
            .min_by(|a, b| {
                a.created_at()
                    .cmp(&b.created_at())
                    .then_with(|| a.id().cmp(b.id()))
            })
            .cloned()
    }

    /// Snapshot sorted by accept time, then id.
    pub async fn infos(&self) -> Vec<ConnectionInfo> {
        let mut infos = Vec::new();
        for connection in self.snapshot().await {
            infos.push(connection.info().await);
        }
        infos.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        infos
    }
}

/// IPv4-mapped IPv6 peers match their IPv4 form.
fn host_matches(addr: &SocketAddr, host: &str) -> bool {
    match host.trim().parse::<IpAddr>() {
        Ok(ip) => addr.ip().to_canonical() == ip.to_canonical(),
        Err(_) => addr.ip().to_string() == host,
    }
}
