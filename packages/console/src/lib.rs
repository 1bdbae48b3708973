//! Operator console for Fieldlink.
//!
//! Embeds a [`fieldlink_server::SocketServer`] and turns operator input such as
//! `1 0 0 1` or `cid:<id> 1 0 0 1` into digital-output (`DO`) records pushed
//! to field devices.

mod command;
mod error;
mod executor;
mod formatter;
mod session;

pub use command::ConsoleCommand;
pub use error::CommandError;
pub use executor::{Outcome, execute};
pub use formatter::ConsoleFormatter;
pub use session::run_console;
