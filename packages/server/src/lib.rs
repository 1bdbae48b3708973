//! Fieldlink TCP registry-and-broadcast server.
//!
//! Field devices connect over plain TCP and exchange newline-delimited JSON
//! records with the server. The server keeps a live registry of connections
//! and lets the rest of the system push records to one device or to all of
//! them through [`SocketServer`]:
//!
//! - [`domain`] holds value objects, the record type and the [`domain::DevicePusher`] seam.
//! - [`infrastructure`] owns connections, the registry, the shared state store and framing.
//! - [`usecase`] interprets decoded records.
//! - [`ui`] binds the listener, runs per-connection sessions and exposes the control API.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;

pub use config::ServerConfig;
pub use ui::{ServerError, SocketServer};
