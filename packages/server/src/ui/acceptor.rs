//! Accept loop.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use tokio::{
    io::AsyncRead,
    net::{TcpListener, TcpStream},
    time::timeout,
};
use tracing::{debug, info, warn};

use crate::{
    domain::ConnectionId,
    infrastructure::{BoxedWriter, Connection, ServerRecord},
};

use super::session::{SessionContext, run_session};

/// Pause after a failed accept so a persistent error does not spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Accept until the stop signal is observed, then release the listener.
pub(super) async fn accept_loop(listener: TcpListener, ctx: Arc<SessionContext>) {
    while !ctx.stop.is_stopped() {
        // bounded wait so the loop re-checks the stop signal
        let Ok(accepted) = timeout(ctx.config.accept_timeout, listener.accept()).await else {
            continue;
        };

        match accepted {
            Ok((stream, peer)) => register(stream, peer, &ctx).await,
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
                tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
            }
        }
    }

    debug!("acceptor stopped");
}

/// Register a fresh connection, greet it, then hand it to its own session task.
async fn register(stream: TcpStream, peer: SocketAddr, ctx: &Arc<SessionContext>) {
    if let Err(e) = stream.set_nodelay(true) {
        debug!(addr = %peer, error = %e, "failed to set TCP_NODELAY");
    }

    let (reader, writer) = stream.into_split();
    admit(reader, Box::new(writer), peer, ctx).await;
}

/// Add the connection to the registry and send `welcome`.
///
/// The session task is spawned only once `welcome` is written, so it is
/// always the first record on the wire. Returns the id of a started session,
/// or `None` if the welcome failed and the connection was dropped.
async fn admit<R>(
    reader: R,
    writer: BoxedWriter,
    peer: SocketAddr,
    ctx: &Arc<SessionContext>,
) -> Option<ConnectionId>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let id = ConnectionId::generate();
    let connection = Arc::new(Connection::new(
        id.clone(),
        peer,
        writer,
        ctx.config.write_timeout,
        ctx.clock.clone(),
    ));
    ctx.registry.add(connection.clone()).await;
    info!(id = %id, addr = %peer, "client connected");

    let welcome = ServerRecord::Welcome {
        client_id: id.clone(),
        ts: ctx.clock.now_millis(),
    };
    if let Err(e) = connection.send_record(&welcome).await {
        warn!(id = %id, error = %e, "welcome failed, dropping client");
        ctx.registry.drop_connection(&id).await;
        return None;
    }

    tokio::spawn(run_session(connection, reader, ctx.clone()));
    Some(id)
}
