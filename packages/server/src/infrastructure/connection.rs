//! One accepted network endpoint.

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicI64, Ordering},
    },
    time::Duration,
};

use fieldlink_shared::time::Clock;
use serde::Serialize;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};
use tracing::debug;

use crate::domain::{ConnectionError, ConnectionId, ConnectionInfo, Record, Timestamp};

use super::codec::encode_record;

/// Write half of a connection's transport.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// A registered peer.
///
/// Identity fields are immutable. Outbound writes are serialized by the
/// writer lock so one record's bytes never interleave with another's.
pub struct Connection {
    id: ConnectionId,
    remote_addr: SocketAddr,
    created_at: Timestamp,
    last_seen_at: AtomicI64,
    name: Mutex<String>,
    last_message: Mutex<Option<Record>>,
    closed: AtomicBool,
    /// `None` once closed
    writer: Mutex<Option<BoxedWriter>>,
    write_timeout: Duration,
    clock: Arc<dyn Clock>,
}

impl Connection {
    pub fn new(
        id: ConnectionId,
        remote_addr: SocketAddr,
        writer: BoxedWriter,
        write_timeout: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let now = clock.now_millis();
        Self {
            id,
            remote_addr,
            created_at: Timestamp::new(now),
            last_seen_at: AtomicI64::new(now),
            name: Mutex::new(String::new()),
            last_message: Mutex::new(None),
            closed: AtomicBool::new(false),
            writer: Mutex::new(Some(writer)),
            write_timeout,
            clock,
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn last_seen_at(&self) -> Timestamp {
        Timestamp::new(self.last_seen_at.load(Ordering::Relaxed))
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub async fn name(&self) -> String {
        self.name.lock().await.clone()
    }

    pub async fn set_name(&self, name: String) {
        *self.name.lock().await = name;
    }

    pub async fn last_message(&self) -> Option<Record> {
        self.last_message.lock().await.clone()
    }

    /// Replace the last message with a freshly decoded record.
    pub async fn record_message(&self, record: Record) {
        *self.last_message.lock().await = Some(record);
        self.touch();
    }

    pub async fn info(&self) -> ConnectionInfo {
        ConnectionInfo {
            id: self.id.clone(),
            remote_addr: self.remote_addr,
            name: self.name().await,
            created_at: self.created_at,
            last_seen_at: self.last_seen_at(),
        }
    }

    /// Encode and write one record.
    pub async fn send_record<T>(&self, record: &T) -> Result<(), ConnectionError>
    where
        T: Serialize + ?Sized,
    {
        let encoded = encode_record(record)?;
        self.send_encoded(&encoded).await
    }

    /// Write already-encoded bytes, bounded by the write timeout.
    pub async fn send_encoded(&self, encoded: &[u8]) -> Result<(), ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }

        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(ConnectionError::Closed)?;

        tokio::time::timeout(self.write_timeout, async {
            writer.write_all(encoded).await?;
            writer.flush().await
        })
        .await
        .map_err(|_| ConnectionError::WriteTimeout)??;

        self.touch();
        Ok(())
    }

    /// Shut down and release the write half.
    ///
    /// The peer sees end-of-stream right away. The read half belongs to the
    /// session task and is released when that session exits, within one read
    /// timeout. Only the first call does anything.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let writer = self.writer.lock().await.take();
        if let Some(mut writer) = writer
            && let Err(e) = writer.shutdown().await
        {
            debug!(id = %self.id, error = %e, "transport shutdown failed");
        }
    }

    fn touch(&self) {
        self.last_seen_at
            .store(self.clock.now_millis(), Ordering::Relaxed);
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("remote_addr", &self.remote_addr)
            .field("created_at", &self.created_at)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}
