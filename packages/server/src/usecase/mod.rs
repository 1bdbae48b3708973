//! Use case layer: interpretation of decoded records.

mod dispatch;
mod error;

pub use dispatch::Dispatcher;
pub use error::RequestError;
