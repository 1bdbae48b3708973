//! Infrastructure layer: sockets, the live registry and the shared store.

pub mod codec;
pub mod connection;
pub mod dto;
pub mod registry;
pub mod state_store;

pub use codec::{LineDecoder, encode_record};
pub use connection::{BoxedWriter, Connection};
pub use dto::{ErrorCode, ServerRecord};
pub use registry::ClientRegistry;
pub use state_store::SharedStateStore;
