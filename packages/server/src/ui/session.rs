//! Per-connection receive loop.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use fieldlink_shared::time::Clock;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    time::timeout,
};
use tracing::{debug, warn};

use crate::{
    ServerConfig,
    infrastructure::{ClientRegistry, Connection, LineDecoder},
    usecase::Dispatcher,
};

/// One-shot stop flag shared by the acceptor and the sessions of one run.
///
/// Every `start()` gets a fresh signal so a lingering task from a previous
/// run never sees it cleared.
#[derive(Debug, Clone, Default)]
pub(super) struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub(super) fn new() -> Self {
        Self::default()
    }

    pub(super) fn trigger(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub(super) fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Everything the acceptor and the sessions of one run share.
pub(super) struct SessionContext {
    pub(super) registry: Arc<ClientRegistry>,
    pub(super) dispatcher: Dispatcher,
    pub(super) stop: StopSignal,
    pub(super) config: ServerConfig,
    pub(super) clock: Arc<dyn Clock>,
}

/// Read, decode and dispatch until end-of-stream, an I/O error, a failed
/// reply, the connection being closed elsewhere, or the stop signal.
///
/// Always ends by dropping the connection from the registry.
pub(super) async fn run_session<R>(connection: Arc<Connection>, mut reader: R, ctx: Arc<SessionContext>)
where
    R: AsyncRead + Unpin,
{
    let mut decoder = LineDecoder::new(ctx.config.max_line_bytes);
    let mut chunk = vec![0u8; ctx.config.read_chunk_size.max(1)];

    'session: while !ctx.stop.is_stopped() && !connection.is_closed() {
        // bounded wait so the loop re-checks the stop signal
        let Ok(read) = timeout(ctx.config.read_timeout, reader.read(&mut chunk)).await else {
            continue;
        };

        let n = match read {
            Ok(0) => {
                debug!(id = %connection.id(), "peer closed the stream");
                break;
            }
            Ok(n) => n,
            Err(e) => {
                debug!(id = %connection.id(), error = %e, "read failed");
                break;
            }
        };

        for record in decoder.decode(&chunk[..n]) {
            // a read already in flight can outlive a drop or stop
            if ctx.stop.is_stopped() || connection.is_closed() {
                debug!(id = %connection.id(), "discarding input after close");
                break 'session;
            }
            connection.record_message(record.clone()).await;
            let reply = ctx.dispatcher.handle(&connection, record).await;
            if let Err(e) = connection.send_record(&reply).await {
                warn!(id = %connection.id(), error = %e, "reply failed");
                break 'session;
            }
        }
    }

    ctx.registry.drop_connection(connection.id()).await;
}
