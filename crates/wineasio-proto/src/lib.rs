//! Wire contract shared by the guest driver object and the native session host.
//!
//! Every type here is `Serialize`/`Deserialize` and crosses the transport pipe
//! bincode-framed. Field names and grouping mirror the original `asio_*_params`
//! parameter blocks one for one; only the marshalling substrate (an IPC byte
//! stream instead of an in-process union-of-structs call) is new.

mod config;
mod op;
mod params;
mod selector;
mod status;
pub mod transport;

pub use config::SessionConfig;
pub use op::TransportOp;
pub use params::*;
pub use selector::FutureSelector;
pub use status::{NativeError, StatusCode, TransportError};
pub use transport::{read_framed, write_framed};

/// Channel direction, as carried in `BufferInfo` and `ChannelInfo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Input,
    Output,
}

/// Maximum channels per direction, fixed by the host ABI.
pub const MAX_CHANNELS: usize = 128;

/// Bytes per sample; the core only ever carries native little-endian f32.
pub const BYTES_PER_SAMPLE: usize = 4;
