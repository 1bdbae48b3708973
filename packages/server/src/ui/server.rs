//! Socket server lifecycle and control API.

use std::{net::SocketAddr, sync::Arc};

use async_trait::async_trait;
use fieldlink_shared::time::{Clock, SystemClock};
use serde_json::Value;
use tokio::{
    net::{TcpListener, TcpSocket, lookup_host},
    sync::Mutex,
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    ServerConfig,
    domain::{ConnectionId, ConnectionInfo, DevicePusher, Record, normalize_record},
    infrastructure::{ClientRegistry, SharedStateStore},
    usecase::Dispatcher,
};

use super::{
    ServerError,
    acceptor::accept_loop,
    session::{SessionContext, StopSignal},
};

/// TCP registry-and-broadcast server
///
/// Built from an explicit [`ServerConfig`]; there is no process-wide
/// instance. The registry and the shared state store outlive `stop()` /
/// `start()` cycles: stopping empties the registry but keeps stored state.
///
/// # Example
///
/// ```no_run
/// use fieldlink_server::{ServerConfig, SocketServer};
/// use serde_json::json;
///
/// # async fn run() -> Result<(), fieldlink_server::ServerError> {
/// let server = SocketServer::new(ServerConfig::new("0.0.0.0", 502));
/// server.start().await?;
///
/// let command = json!({"DO": [1, 0, 0, 1]});
/// let delivered = server.broadcast(command.as_object().unwrap(), None).await;
/// println!("delivered to {} devices", delivered);
///
/// server.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct SocketServer {
    config: ServerConfig,
    clock: Arc<dyn Clock>,
    registry: Arc<ClientRegistry>,
    state: Arc<SharedStateStore>,
    running: Mutex<Option<Running>>,
}

/// A live run between `start()` and `stop()`.
struct Running {
    local_addr: SocketAddr,
    stop: StopSignal,
    acceptor: JoinHandle<()>,
}

impl SocketServer {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a server whose record timestamps come from `clock`.
    pub fn with_clock(config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            registry: Arc::new(ClientRegistry::new()),
            state: Arc::new(SharedStateStore::new()),
            running: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the listener and launch the acceptor.
    ///
    /// A no-op returning the current address while already running.
    ///
    /// # Errors
    ///
    /// Returns an error if the address does not resolve or cannot be bound
    /// (e.g., the port is already in use).
    pub async fn start(&self) -> Result<SocketAddr, ServerError> {
        let mut running = self.running.lock().await;
        if let Some(running) = running.as_ref() {
            debug!("Socket server already running on {}", running.local_addr);
            return Ok(running.local_addr);
        }

        let listener = bind_listener(&self.config).await?;
        let local_addr = listener.local_addr()?;

        let stop = StopSignal::new();
        let ctx = Arc::new(SessionContext {
            registry: self.registry.clone(),
            dispatcher: Dispatcher::new(
                self.registry.clone(),
                self.state.clone(),
                self.clock.clone(),
            ),
            stop: stop.clone(),
            config: self.config.clone(),
            clock: self.clock.clone(),
        });
        let acceptor = tokio::spawn(accept_loop(listener, ctx));

        info!("Socket server listening on {}", local_addr);
        *running = Some(Running {
            local_addr,
            stop,
            acceptor,
        });
        Ok(local_addr)
    }

    /// Signal every loop to stop, release the listener, then close and
    /// forget every connection.
    ///
    /// Safe to call when not running.
    pub async fn stop(&self) {
        let mut running = self.running.lock().await;

        if let Some(Running {
            local_addr,
            stop,
            mut acceptor,
        }) = running.take()
        {
            stop.trigger();
            if tokio::time::timeout(self.config.shutdown_grace, &mut acceptor)
                .await
                .is_err()
            {
                warn!("Acceptor on {} did not exit in time, aborting it", local_addr);
                acceptor.abort();
            }
        }

        let closed = self.registry.close_all().await;
        info!(closed, "Socket server stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    /// Bound address while running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.running
            .lock()
            .await
            .as_ref()
            .map(|running| running.local_addr)
    }

    /// Unicast `payload` to one connection.
    ///
    /// Returns `false` for an unknown id. A failed write drops the connection
    /// and also returns `false`.
    pub async fn send(&self, id: &ConnectionId, payload: &Record) -> bool {
        self.registry.send(id, payload).await
    }

    /// Deliver `payload` to every connection except `exclude`.
    ///
    /// Returns the number of successful deliveries; failing targets are dropped.
    pub async fn broadcast(&self, payload: &Record, exclude: Option<&ConnectionId>) -> usize {
        self.registry.broadcast(payload, exclude).await
    }

    /// Id of the first registered connection whose remote host is `host`.
    ///
    /// With several connections from one host, the earliest accepted wins.
    pub async fn connection_id_by_address(&self, host: &str) -> Option<ConnectionId> {
        self.registry
            .find_by_host(host)
            .await
            .map(|connection| connection.id().clone())
    }

    /// Last record received from the connection at `host`.
    ///
    /// An unknown host or a connection that has not sent anything yields an
    /// empty record.
    pub async fn last_message_by_address(&self, host: &str) -> Record {
        let Some(connection) = self.registry.find_by_host(host).await else {
            return Record::new();
        };
        normalize_record(connection.last_message().await.map(Value::Object))
    }

    pub async fn connections(&self) -> Vec<ConnectionInfo> {
        self.registry.infos().await
    }

    pub async fn connection_count(&self) -> usize {
        self.registry.len().await
    }

    pub async fn get_state(&self, key: &str) -> Option<Value> {
        self.state.get(key).await
    }

    pub async fn set_state(&self, key: impl Into<String>, value: Value) {
        self.state.set(key.into(), value).await;
    }
}

#[async_trait]
impl DevicePusher for SocketServer {
    async fn send(&self, id: &ConnectionId, payload: &Record) -> bool {
        SocketServer::send(self, id, payload).await
    }

    async fn broadcast(&self, payload: &Record, exclude: Option<&ConnectionId>) -> usize {
        SocketServer::broadcast(self, payload, exclude).await
    }

    async fn connections(&self) -> Vec<ConnectionInfo> {
        SocketServer::connections(self).await
    }
}

/// Resolve the configured address and listen on it with the configured backlog.
async fn bind_listener(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let bind_addr = config.bind_addr();
    let addr = lookup_host(&bind_addr)
        .await
        .map_err(|_| ServerError::AddressResolution(bind_addr.clone()))?
        .next()
        .ok_or_else(|| ServerError::AddressResolution(bind_addr.clone()))?;

    let bind_error = |source| ServerError::Bind {
        addr: addr.to_string(),
        source,
    };

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .map_err(bind_error)?;
    socket.set_reuseaddr(true).map_err(bind_error)?;
    socket.bind(addr).map_err(bind_error)?;
    socket.listen(config.backlog).map_err(bind_error)
}
