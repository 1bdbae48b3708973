//! Listener, per-connection sessions and the control API.

mod acceptor;
mod error;
mod server;
mod session;
pub mod signal;

pub use error::ServerError;
pub use server::SocketServer;
