//! Domain layer: value objects, records and the device-push seam.
//!
//! Nothing here touches sockets; the infrastructure and ui layers build on
//! these types.

mod error;
mod pusher;
mod record;
mod value_object;

pub use error::{ConnectionError, ValueObjectError};
pub use pusher::{ConnectionInfo, DevicePusher};
pub use record::{Record, normalize_record, record_from_str};
pub use value_object::{ConnectionId, Timestamp};
